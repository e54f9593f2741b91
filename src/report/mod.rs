//! Report generation: text layouts and JSON
//!
//! The text report has two layouts: full inventory and targeted detection.
//! Both share the header, the SDK list and the technical-details footer.
//! Every collection in an `AnalysisReport` is already sorted, so rendering
//! the same report twice yields the same bytes; only the timestamp lines
//! change between runs.

pub mod detection;
pub mod inventory;
pub mod json;
mod sections;

use crate::engine::{AnalysisMode, AnalysisReport};
use crate::ProbeResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output format for the report file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable text (inventory or detection layout)
    #[default]
    Text,
    /// The full `AnalysisReport` as pretty-printed JSON
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

/// Render a report to a string
pub fn render_report(report: &AnalysisReport, format: ReportFormat) -> ProbeResult<String> {
    match format {
        ReportFormat::Json => json::render(report),
        ReportFormat::Text => Ok(match report.mode {
            AnalysisMode::Inventory => inventory::render(report),
            AnalysisMode::Detection { .. } => detection::render(report),
        }),
    }
}

/// Render and write a report into `dir`. `name` overrides the derived file
/// name. Returns the written path and the rendered text.
pub fn write_report(
    report: &AnalysisReport,
    format: ReportFormat,
    dir: &Path,
    name: Option<&str>,
) -> ProbeResult<(PathBuf, String)> {
    let content = render_report(report, format)?;
    std::fs::create_dir_all(dir)?;
    let file_name = match name {
        Some(n) => n.to_string(),
        None => default_file_name(report, format),
    };
    let path = dir.join(file_name);
    std::fs::write(&path, &content)?;
    tracing::info!("Report written to {}", path.display());
    Ok((path, content))
}

/// `{inventory|detection}-android-{slug}-{timestamp}.{txt|json}`
pub fn default_file_name(report: &AnalysisReport, format: ReportFormat) -> String {
    let facts = &report.metadata.facts;
    let subject = if facts.has_package_id() {
        facts.package_id.as_str()
    } else if facts.has_display_name() {
        facts.display_name.as_str()
    } else {
        ""
    };
    format!(
        "{}-android-{}-{}.{}",
        report.mode.tag(),
        slugify(subject),
        report.generated_at.format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}

/// Lower-case, collapse every run of characters outside `[a-z0-9-]` into a
/// single hyphen, trim hyphens at the ends
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_gap = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            if pending_gap {
                out.push('-');
                pending_gap = false;
            }
            out.push(ch);
        } else {
            pending_gap = true;
        }
    }
    let slug = out.trim_matches('-');
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::analysis::PackageMetadata;
    use crate::engine::{AnalysisMode, AnalysisReport};
    use chrono::{TimeZone, Utc};

    pub fn empty_report(mode: AnalysisMode) -> AnalysisReport {
        AnalysisReport {
            mode,
            generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap(),
            tool_version: "0.0.0".into(),
            decompiler: "fake".into(),
            code_scan_cap: 50,
            package_listing_limit: 20,
            source: "app.apk".into(),
            package_sha256: None,
            metadata: PackageMetadata::default(),
            libraries: vec![],
            architectures: vec![],
            sdks: vec![],
            evidence: vec![],
            competitor_matches: vec![],
            competitors_checked: 0,
            merge: None,
            stages: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::empty_report;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify("com.Example.App"), "com-example-app");
        assert_eq!(slugify("My  Cool__App!"), "my-cool-app");
        assert_eq!(slugify("already-slugged"), "already-slugged");
        assert_eq!(slugify("  ..  "), "unknown");
    }

    #[test]
    fn test_default_file_name_prefers_package_id() {
        let mut report = empty_report(AnalysisMode::Inventory);
        assert_eq!(
            default_file_name(&report, ReportFormat::Text),
            "inventory-android-unknown-20260301-123005.txt"
        );

        report.metadata.facts.display_name = "Pdf Viewer".into();
        assert_eq!(
            default_file_name(&report, ReportFormat::Json),
            "inventory-android-pdf-viewer-20260301-123005.json"
        );

        report.metadata.facts.package_id = "com.example.viewer".into();
        report.mode = AnalysisMode::detection(["x"]).unwrap();
        assert_eq!(
            default_file_name(&report, ReportFormat::Text),
            "detection-android-com-example-viewer-20260301-123005.txt"
        );
    }

    #[test]
    fn test_write_report_returns_written_text() {
        let dir = TempDir::new().unwrap();
        let report = empty_report(AnalysisMode::Inventory);
        let (path, text) = write_report(&report, ReportFormat::Text, &dir.path().join("out"), Some("r.txt")).unwrap();
        assert_eq!(path, dir.path().join("out").join("r.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), text);
    }
}
