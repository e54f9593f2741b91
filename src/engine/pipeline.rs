//! Probe pipeline: each evidence channel implements `EvidenceProbe`
//!
//! Probes are independent: every one reads the shared `PackageIndex` and
//! reports hits for a single keyword. The pipeline runs them in the fixed
//! channel order and folds the hits into one `EvidenceRecord`.

use super::file_index::{PackageIndex, TreeArea};
use super::ProbeConfig;
use crate::evidence::{ChannelHits, EvidenceChannel, EvidenceRecord};
use std::path::Path;

// ─── Keyword ───────────────────────────────────────────────────────

/// A search keyword with its case-folded needle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub text: String,
    pub needle: String,
}

impl Keyword {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let needle = text.to_lowercase();
        Self { text, needle }
    }

    /// Literal, case-insensitive substring test
    pub fn matches(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.needle)
    }

    /// Number of non-overlapping occurrences in `haystack`, case-insensitive
    pub fn occurrences(&self, haystack: &str) -> usize {
        if self.needle.is_empty() {
            return 0;
        }
        haystack.to_lowercase().matches(self.needle.as_str()).count()
    }
}

// ─── Scan Context ──────────────────────────────────────────────────

/// Immutable context shared by every probe during one run
pub struct ScanContext {
    pub config: ProbeConfig,
    pub index: PackageIndex,
}

impl ScanContext {
    pub fn new(config: ProbeConfig, index: PackageIndex) -> Self {
        Self { config, index }
    }
}

// ─── Probe Trait ───────────────────────────────────────────────────

/// One evidence channel
pub trait EvidenceProbe: Send + Sync {
    fn channel(&self) -> EvidenceChannel;

    /// The package area this probe reads; absent areas skip the probe
    fn area(&self) -> TreeArea;

    fn probe(&self, keyword: &Keyword, ctx: &ScanContext) -> ChannelHits;
}

/// Run every probe for one keyword and freeze the result
pub fn scan_keyword(
    probes: &[Box<dyn EvidenceProbe>],
    keyword: &str,
    ctx: &ScanContext,
) -> EvidenceRecord {
    let kw = Keyword::new(keyword);
    let mut builder = EvidenceRecord::builder(keyword);

    for probe in probes {
        if !ctx.index.has_area(probe.area()) {
            builder.skip(probe.channel());
            continue;
        }
        let start = std::time::Instant::now();
        let hits = probe.probe(&kw, ctx);
        tracing::debug!(
            "  {} '{}': {} hit(s) in {}ms",
            probe.channel(),
            keyword,
            hits.count,
            start.elapsed().as_millis()
        );
        builder.record(probe.channel(), hits);
    }

    let record = builder.finalize();
    tracing::info!(
        "'{}': {} ({} hits)",
        keyword,
        if record.found { "FOUND" } else { "not found" },
        record.total_hits()
    );
    record
}

/// Read a text file lossily; unreadable files count as empty
pub fn read_text(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::debug!("Skipping unreadable {}: {}", path.display(), e);
            String::new()
        }
    }
}
