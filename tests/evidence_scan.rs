//! Keyword evidence across the six channels, driven through the engine

mod common;

use common::{decompiled_fixture, raw_fixture, touch, without_timestamp};
use sdkprobe::engine::{AnalysisMode, Engine, ProbeConfig};
use sdkprobe::evidence::EvidenceChannel;
use sdkprobe::report::{render_report, ReportFormat};
use tempfile::TempDir;

fn fixture() -> (TempDir, TempDir) {
    let decompiled = TempDir::new().unwrap();
    let raw = TempDir::new().unwrap();
    decompiled_fixture(decompiled.path());
    raw_fixture(raw.path());
    (decompiled, raw)
}

fn detect(keywords: &[&str], dec: &TempDir, raw: &TempDir) -> sdkprobe::AnalysisReport {
    Engine::default()
        .analyze_trees(dec.path(), raw.path(), AnalysisMode::detection(keywords).unwrap())
        .unwrap()
}

#[test]
fn test_manifest_literal_is_found() {
    let dec = TempDir::new().unwrap();
    touch(dec.path(), "AndroidManifest.xml", "<manifest package=\"x\">\n<activity android:name=\"com.pspdfkit.ui.PdfActivity\"/>\n</manifest>");

    let report = Engine::default()
        .analyze_trees(dec.path(), dec.path(), AnalysisMode::detection(["pspdfkit"]).unwrap())
        .unwrap();
    let record = report.evidence_for("pspdfkit").unwrap();
    assert!(record.count(EvidenceChannel::Manifest) >= 1);
    assert!(record.found);
    assert!(record.location_summary.starts_with("Found in: AndroidManifest.xml"));
}

#[test]
fn test_every_channel_contributes() {
    let (dec, raw) = fixture();
    let report = detect(&["pspdfkit"], &dec, &raw);
    let r = report.evidence_for("pspdfkit").unwrap();

    assert_eq!(r.count(EvidenceChannel::Manifest), 2);
    assert_eq!(r.count(EvidenceChannel::ResourceXml), 2);
    assert_eq!(r.channel(EvidenceChannel::ResourceXml).files, vec!["res/layout/viewer.xml"]);
    // PdfActivity.smali: path contains the keyword but the name does not,
    // so it only counts through content; Main.smali is not a candidate
    assert_eq!(r.count(EvidenceChannel::Code), 1);
    assert_eq!(r.count(EvidenceChannel::NativeLibraryName), 2);
    assert_eq!(r.count(EvidenceChannel::Assets), 0);
    assert_eq!(r.count(EvidenceChannel::LibraryMetadata), 1);
    assert!(r.found);
}

#[test]
fn test_case_insensitive_and_deterministic() {
    let (dec, raw) = fixture();
    let upper = detect(&["PSPDFKit"], &dec, &raw);
    let lower = detect(&["pspdfkit"], &dec, &raw);
    let again = detect(&["pspdfkit"], &dec, &raw);

    let counts = |r: &sdkprobe::AnalysisReport| {
        let rec = &r.evidence[0];
        EvidenceChannel::ALL.map(|c| rec.count(c))
    };
    assert_eq!(counts(&upper), counts(&lower));
    assert_eq!(lower.evidence, again.evidence);
}

#[test]
fn test_found_iff_any_channel_positive() {
    let (dec, raw) = fixture();
    let report = detect(&["pspdfkit", "nutrient", "androidx"], &dec, &raw);
    for r in &report.evidence {
        assert_eq!(r.found, EvidenceChannel::ALL.iter().any(|c| r.count(*c) > 0), "{}", r.keyword);
    }
    assert!(!report.evidence_for("nutrient").unwrap().found);
    assert!(report.evidence_for("androidx").unwrap().found);
}

#[test]
fn test_absent_channels_are_skipped_not_failed() {
    let dec = TempDir::new().unwrap();
    touch(dec.path(), "AndroidManifest.xml", "<manifest package=\"x\"/>");
    let report = Engine::default()
        .analyze_trees(dec.path(), dec.path(), AnalysisMode::detection(["foo"]).unwrap())
        .unwrap();
    let r = &report.evidence[0];
    assert!(r.channel(EvidenceChannel::Manifest).scanned);
    assert!(!r.channel(EvidenceChannel::Code).scanned);
    assert!(!r.channel(EvidenceChannel::NativeLibraryName).scanned);
    assert_eq!(r.location_summary, "No matches in any detection channel");
}

#[test]
fn test_code_content_search_respects_cap() {
    let dec = TempDir::new().unwrap();
    touch(dec.path(), "AndroidManifest.xml", "<manifest package=\"x\"/>");
    for i in 0..5 {
        touch(dec.path(), &format!("smali/com/vendor/V{}.smali", i), "Lcom/acme/Engine;");
    }
    let run = |cap: usize| {
        let config = ProbeConfig { code_scan_file_cap: cap, ..ProbeConfig::default() };
        Engine::new(config)
            .analyze_trees(dec.path(), dec.path(), AnalysisMode::detection(["acme"]).unwrap())
            .unwrap()
            .evidence[0]
            .count(EvidenceChannel::Code)
    };
    assert_eq!(run(50), 5);
    assert_eq!(run(2), 2);
    assert_eq!(run(0), 0);
}

#[test]
fn test_targeted_report_branches_on_found() {
    let (dec, raw) = fixture();
    let report = detect(&["pspdfkit", "nutrient"], &dec, &raw);
    let text = render_report(&report, ReportFormat::Text).unwrap();

    assert!(text.contains("[FOUND]     pspdfkit"));
    assert!(text.contains("[NOT FOUND] nutrient"));
    assert!(text.contains("Found (1): pspdfkit"));
    assert!(text.contains("Not found (1): nutrient"));
    assert!(text.contains("contains SDK(s) matching: pspdfkit"));
    assert!(text.contains("Package:          com.example.viewer"));

    let none = detect(&["nutrient"], &dec, &raw);
    let text = render_report(&none, ReportFormat::Text).unwrap();
    assert!(!text.contains("contains SDK(s)"));
    assert!(text.contains("No evidence of nutrient"));
}

#[test]
fn test_report_body_is_deterministic() {
    let (dec, raw) = fixture();
    let a = render_report(&detect(&["pspdfkit", "nutrient"], &dec, &raw), ReportFormat::Text).unwrap();
    let b = render_report(&detect(&["pspdfkit", "nutrient"], &dec, &raw), ReportFormat::Text).unwrap();
    assert_eq!(without_timestamp(&a), without_timestamp(&b));
}
