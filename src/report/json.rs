//! JSON report renderer

use crate::engine::AnalysisReport;
use crate::ProbeResult;

/// Render an analysis report as pretty-printed JSON
pub fn render(report: &AnalysisReport) -> ProbeResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AnalysisMode;
    use crate::report::test_support::empty_report;

    #[test]
    fn test_json_carries_mode_and_keywords() {
        let report = empty_report(AnalysisMode::detection(["pspdfkit"]).unwrap());
        let json: serde_json::Value = serde_json::from_str(&render(&report).unwrap()).unwrap();
        assert_eq!(json["mode"]["mode"], "detection");
        assert_eq!(json["mode"]["keywords"][0], "pspdfkit");
        assert_eq!(json["metadata"]["facts"]["package_id"], "unknown");
    }
}
