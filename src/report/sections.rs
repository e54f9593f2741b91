//! Sections shared by both text layouts

use crate::detection::SdkSource;
use crate::engine::AnalysisReport;

pub const RULE: &str = "======================================================================";
pub const THIN_RULE: &str = "----------------------------------------------------------------------";

pub fn heading(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(THIN_RULE);
    out.push('\n');
}

pub fn field(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("  {:<18}{}\n", format!("{}:", label), value));
}

pub fn title(out: &mut String, text: &str) {
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!("  {}\n", text));
    out.push_str(RULE);
    out.push('\n');
}

/// Application identity, common to both layouts
pub fn app_header(out: &mut String, report: &AnalysisReport) {
    let facts = &report.metadata.facts;
    heading(out, "APPLICATION");
    field(out, "Package", &facts.package_id);
    field(out, "Name", &facts.display_name);
    field(out, "Version", &format!("{} (code {})", facts.version_name, facts.version_code));
    field(out, "Min SDK", &facts.min_sdk);
    field(out, "Target SDK", &facts.target_sdk);
    field(out, "Input", &report.source);
    if let Some(merge) = &report.merge {
        field(
            out,
            "Reconstructed",
            &format!(
                "{} + {} architecture split(s) + {} other split(s), {} entries",
                merge.base,
                merge.architecture_splits.len(),
                merge.config_splits.len(),
                merge.entries_written
            ),
        );
        if !merge.collisions.is_empty() {
            field(
                out,
                "Merge collisions",
                &format!("{} path(s) overwritten with different content", merge.collisions.len()),
            );
        }
        if !merge.rejected_entries.is_empty() {
            field(
                out,
                "Skipped entries",
                &format!("{} with unsafe names", merge.rejected_entries.len()),
            );
        }
    }
}

/// The aggregated "all detected SDKs" list
pub fn sdk_list(out: &mut String, report: &AnalysisReport) {
    heading(out, &format!("ALL DETECTED SDKS ({})", report.sdks.len()));
    if report.sdks.is_empty() {
        out.push_str("  No SDKs identified from version stamps or library vendors.\n");
        return;
    }
    for sdk in &report.sdks {
        let mut line = format!("  - {}", sdk.name);
        if let Some(v) = &sdk.version {
            line.push_str(&format!(" {}", v));
        }
        if let Some(vendor) = &sdk.vendor {
            line.push_str(&format!(" [{}]", vendor));
        }
        line.push_str(match sdk.source {
            SdkSource::VersionStamp => "  (version stamp)",
            SdkSource::NativeLibrary => "  (native library)",
        });
        out.push_str(&line);
        out.push('\n');
    }
}

/// One-line count of native libraries, with architectures
pub fn native_count_line(report: &AnalysisReport) -> String {
    let n = report.libraries.len();
    if n == 0 {
        return "0 native libraries found.".to_string();
    }
    format!(
        "{} native librar{} across {} architecture(s): {}",
        n,
        if n == 1 { "y" } else { "ies" },
        report.architectures.len(),
        report.architectures.join(", ")
    )
}

/// Fixed technical-details footer
pub fn footer(out: &mut String, report: &AnalysisReport) {
    heading(out, "TECHNICAL DETAILS");
    field(out, "Tool", &format!("sdkprobe {}", report.tool_version));
    field(out, "Decompiler", &report.decompiler);
    field(out, "Code scan cap", &format!("{} files per keyword", report.code_scan_cap));
    if let Some(sha) = &report.package_sha256 {
        field(out, "Package SHA-256", sha);
    }
    field(
        out,
        "Generated",
        &report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    out.push_str(RULE);
    out.push('\n');
}

pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB {
        format!("{:.1} MB", b / (KB * KB))
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_reports_merge_problems() {
        use crate::engine::AnalysisMode;
        use crate::ingest::split::{MergeCollision, MergeOutcome};
        use crate::report::test_support::empty_report;

        let mut report = empty_report(AnalysisMode::Inventory);
        report.merge = Some(MergeOutcome {
            output: "merged.apk".into(),
            output_bytes: 10,
            base: "base.apk".to_string(),
            architecture_splits: vec!["split_config.arm64_v8a.apk".to_string()],
            config_splits: vec![],
            entries_written: 4,
            collisions: vec![MergeCollision {
                path: "lib/x.cfg".into(),
                overwritten_by: "split_config.arm64_v8a.apk".to_string(),
            }],
            rejected_entries: vec!["../evil.txt".to_string()],
        });

        let mut out = String::new();
        app_header(&mut out, &report);
        assert!(out.contains("base.apk + 1 architecture split(s) + 0 other split(s), 4 entries"));
        assert!(out.contains("1 path(s) overwritten with different content"));
        assert!(out.contains("Skipped entries:  1 with unsafe names"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
