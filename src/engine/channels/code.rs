//! Decompiled-code channel: two-stage, cost-bounded search
//!
//! Stage 1 counts every code file whose name contains the keyword. Stage 2
//! reads the contents of at most `code_scan_file_cap` files, and only files
//! whose relative path contains the keyword or one of `code_scan_tokens`.
//! Content-only matches outside that filtered, capped set are missed: large
//! trees with unconventional package names can produce false negatives here.

use crate::engine::file_index::TreeArea;
use crate::engine::pipeline::{read_text, EvidenceProbe, Keyword, ScanContext};
use crate::evidence::{ChannelHits, EvidenceChannel};

pub struct CodeProbe;

impl CodeProbe {
    pub fn new() -> Self { Self }
}

impl EvidenceProbe for CodeProbe {
    fn channel(&self) -> EvidenceChannel {
        EvidenceChannel::Code
    }

    fn area(&self) -> TreeArea {
        TreeArea::Code
    }

    fn probe(&self, keyword: &Keyword, ctx: &ScanContext) -> ChannelHits {
        let files = ctx.index.area(TreeArea::Code);
        let mut hits = ChannelHits::default();

        // Stage 1: file names
        for file in &files {
            if file.name_lower().contains(&keyword.needle) {
                hits.add_file(&file.rel, 1);
            }
        }

        // Stage 2: bounded content search
        let tokens: Vec<String> = ctx
            .config
            .code_scan_tokens
            .iter()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        let cap = ctx.config.code_scan_file_cap;

        let candidates: Vec<_> = files
            .iter()
            .filter(|f| {
                let rel = f.rel.to_lowercase();
                rel.contains(&keyword.needle) || tokens.iter().any(|t| rel.contains(t.as_str()))
            })
            .take(cap)
            .collect();

        let mut content_hits = 0usize;
        for file in &candidates {
            if keyword.matches(&read_text(&file.path)) {
                hits.add_file(&file.rel, 1);
                content_hits += 1;
            }
        }

        tracing::debug!(
            "Code channel '{}': {} name hit(s), {} content hit(s) in {} of {} files (cap {})",
            keyword.text,
            hits.count - content_hits,
            content_hits,
            candidates.len(),
            files.len(),
            cap
        );
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::file_index::PackageIndex;
    use crate::engine::ProbeConfig;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &std::path::Path, rel: &str, content: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, content).unwrap();
    }

    fn ctx_for(root: &std::path::Path, cap: usize) -> ScanContext {
        let config = ProbeConfig {
            code_scan_file_cap: cap,
            ..ProbeConfig::default()
        };
        ScanContext::new(config, PackageIndex::build(root, root))
    }

    #[test]
    fn test_name_and_filtered_content_hits() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "AndroidManifest.xml", "<manifest/>");
        // name hit
        touch(dir.path(), "smali/com/x/PspdfkitLoader.smali", "nothing");
        // content hit inside a path carrying a generic token
        touch(dir.path(), "smali/com/vendor/Loader.smali", "const-string v0, \"pspdfkit\"");
        // content-only match outside the filtered set: missed by design
        touch(dir.path(), "smali/com/app/Main.smali", "invoke pspdfkit");

        let ctx = ctx_for(dir.path(), 50);
        let hits = CodeProbe::new().probe(&Keyword::new("PSPDFKit"), &ctx);
        assert_eq!(hits.count, 2);
        assert!(hits.files.contains(&"smali/com/vendor/Loader.smali".to_string()));
        assert!(!hits.files.contains(&"smali/com/app/Main.smali".to_string()));
    }

    #[test]
    fn test_content_search_respects_cap() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "AndroidManifest.xml", "<manifest/>");
        for i in 0..5 {
            touch(dir.path(), &format!("smali/com/sdk/C{}.smali", i), "acme");
        }
        let capped = CodeProbe::new().probe(&Keyword::new("acme"), &ctx_for(dir.path(), 3));
        assert_eq!(capped.count, 3);
        let full = CodeProbe::new().probe(&Keyword::new("acme"), &ctx_for(dir.path(), 50));
        assert_eq!(full.count, 5);
    }
}
