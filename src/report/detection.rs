//! Targeted-detection layout
//!
//! One found/not-found banner per requested keyword with per-channel detail,
//! SDK and native-library context, the detection methods, and a conclusion
//! whose wording depends on whether anything was found.

use super::sections::{self, heading};
use crate::engine::AnalysisReport;
use crate::evidence::{EvidenceChannel, EvidenceRecord};

pub fn render(report: &AnalysisReport) -> String {
    let mut out = String::with_capacity(8192);
    sections::title(&mut out, "ANDROID SDK DETECTION REPORT");
    sections::app_header(&mut out, report);
    results(&mut out, report);
    sections::sdk_list(&mut out, report);
    native_summary(&mut out, report);
    methods(&mut out, report);
    conclusion(&mut out, report);
    sections::footer(&mut out, report);
    out
}

fn results(out: &mut String, report: &AnalysisReport) {
    heading(out, "DETECTION RESULTS");
    for record in &report.evidence {
        banner(out, record);
    }

    let found: Vec<&str> = report.found().map(|r| r.keyword.as_str()).collect();
    let missing: Vec<&str> = report.not_found().map(|r| r.keyword.as_str()).collect();
    out.push('\n');
    out.push_str(&format!("  Found ({}): {}\n", found.len(), list_or_none(&found)));
    out.push_str(&format!("  Not found ({}): {}\n", missing.len(), list_or_none(&missing)));
}

fn banner(out: &mut String, record: &EvidenceRecord) {
    let status = if record.found { "[FOUND]    " } else { "[NOT FOUND]" };
    out.push_str(&format!("\n  {} {}\n", status, record.keyword));
    out.push_str(&format!("              {}\n", record.location_summary));
    for ch in &record.channels {
        let detail = if !ch.scanned {
            "not present in package".to_string()
        } else {
            ch.count.to_string()
        };
        out.push_str(&format!("              - {:<30} {}\n", ch.channel.label(), detail));
    }
}

fn native_summary(out: &mut String, report: &AnalysisReport) {
    heading(out, "NATIVE LIBRARIES");
    out.push_str(&format!("  {}\n", sections::native_count_line(report)));
    let mut names: Vec<&str> = report.libraries.iter().map(|l| l.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    for name in names {
        out.push_str(&format!("    {}\n", name));
    }
}

fn methods(out: &mut String, report: &AnalysisReport) {
    heading(out, "DETECTION METHODS");
    for (i, ch) in EvidenceChannel::ALL.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, ch.method()));
    }
    out.push_str(&format!(
        "  All searches are literal and case-insensitive. Code content search reads at most\n  {} candidate files per keyword and can miss matches outside them.\n",
        report.code_scan_cap
    ));
}

fn conclusion(out: &mut String, report: &AnalysisReport) {
    heading(out, "CONCLUSION");
    let found: Vec<&str> = report.found().map(|r| r.keyword.as_str()).collect();
    let app = &report.metadata.facts.package_id;
    if found.is_empty() {
        let requested: Vec<&str> = report.evidence.iter().map(|r| r.keyword.as_str()).collect();
        out.push_str(&format!(
            "  No evidence of {} was found in {} across all six detection channels.\n",
            requested.join(", "),
            app
        ));
        out.push_str(
            "  Absence of evidence is not proof of absence: obfuscated or renamed code\n  may not be detected.\n",
        );
    } else {
        out.push_str(&format!(
            "  The application {} contains SDK(s) matching: {}.\n",
            app,
            found.join(", ")
        ));
        out.push_str("  See the per-channel evidence above for where each match was observed.\n");
    }
}

fn list_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AnalysisMode;
    use crate::evidence::ChannelHits;
    use crate::report::test_support::empty_report;

    fn record(keyword: &str, manifest_hits: usize) -> EvidenceRecord {
        let mut b = EvidenceRecord::builder(keyword);
        b.record(EvidenceChannel::Manifest, ChannelHits { count: manifest_hits, files: vec![] });
        b.finalize()
    }

    #[test]
    fn test_found_branch() {
        let mut report = empty_report(AnalysisMode::detection(["pspdfkit", "nutrient"]).unwrap());
        report.evidence = vec![record("pspdfkit", 2), record("nutrient", 0)];
        let text = render(&report);
        assert!(text.contains("[FOUND]     pspdfkit"));
        assert!(text.contains("[NOT FOUND] nutrient"));
        assert!(text.contains("Found (1): pspdfkit"));
        assert!(text.contains("Not found (1): nutrient"));
        assert!(text.contains("contains SDK(s) matching: pspdfkit"));
        assert!(text.contains("DETECTION METHODS"));
    }

    #[test]
    fn test_not_found_branch() {
        let mut report = empty_report(AnalysisMode::detection(["nutrient"]).unwrap());
        report.evidence = vec![record("nutrient", 0)];
        let text = render(&report);
        assert!(text.contains("No evidence of nutrient"));
        assert!(!text.contains("contains SDK(s)"));
        assert!(text.contains("not present in package"));
    }
}
