//! Full-inventory layout
//!
//! App facts, aggregated SDKs, competitor warnings, native libraries, code
//! packages, dependency versions, then permissions/features/build/assets.

use super::sections::{self, field, format_size, heading};
use crate::engine::AnalysisReport;

pub fn render(report: &AnalysisReport) -> String {
    let mut out = String::with_capacity(8192);
    sections::title(&mut out, "ANDROID SDK INVENTORY REPORT");
    sections::app_header(&mut out, report);
    sections::sdk_list(&mut out, report);
    competitors(&mut out, report);
    native_libraries(&mut out, report);
    code_packages(&mut out, report);
    dependency_versions(&mut out, report);
    permissions(&mut out, report);
    features(&mut out, report);
    build_info(&mut out, report);
    assets_and_resources(&mut out, report);
    sections::footer(&mut out, report);
    out
}

fn competitors(out: &mut String, report: &AnalysisReport) {
    heading(out, &format!("POTENTIAL COMPETITOR SDKS ({})", report.competitor_matches.len()));
    for m in &report.competitor_matches {
        out.push_str(&format!(
            "  ! {} ({}, {}) resembles \"{}\"\n",
            m.library_name,
            m.library_path,
            format_size(m.library_size),
            m.competitor
        ));
    }
    if !report.competitor_matches.is_empty() {
        out.push_str("  Name-based matches are potential only and need manual confirmation.\n");
    }
}

fn native_libraries(out: &mut String, report: &AnalysisReport) {
    heading(out, "NATIVE LIBRARIES");
    out.push_str(&format!("  {}\n", sections::native_count_line(report)));

    let mut current_arch: Option<&str> = None;
    for lib in &report.libraries {
        if current_arch != Some(lib.architecture.as_str()) {
            let arch = if lib.architecture.is_empty() { "(no ABI directory)" } else { &lib.architecture };
            out.push_str(&format!("\n  [{}]\n", arch));
            current_arch = Some(lib.architecture.as_str());
        }
        out.push_str(&format!("    {:<36} {:>10}\n", lib.name, format_size(lib.size)));

        let mut details = Vec::new();
        if let Some(d) = &lib.description {
            details.push(d.clone());
        }
        if let Some(v) = &lib.vendor {
            details.push(format!("vendor: {}", v));
        }
        if let Some(v) = &lib.version {
            details.push(format!("version: {}", v));
        }
        if !details.is_empty() {
            out.push_str(&format!("      {}\n", details.join("; ")));
        }
    }
}

fn code_packages(out: &mut String, report: &AnalysisReport) {
    let all = &report.metadata.code_packages;
    let shown = all.len().min(report.package_listing_limit);
    heading(out, &format!("TOP-LEVEL CODE PACKAGES (showing {} of {})", shown, all.len()));
    if all.is_empty() {
        out.push_str("  No decompiled code found.\n");
    }
    for pkg in all.iter().take(shown) {
        out.push_str(&format!("  {:<40} {} class file(s)\n", pkg.name, pkg.class_files));
    }
}

fn dependency_versions(out: &mut String, report: &AnalysisReport) {
    let md = &report.metadata;
    heading(out, &format!("BUNDLED DEPENDENCY VERSIONS ({})", md.version_stamps.len()));
    if md.version_stamps.is_empty() {
        out.push_str("  No version stamps found.\n");
    }
    for stamp in &md.version_stamps {
        out.push_str(&format!("  {:<48} {}\n", stamp.library, stamp.version));
    }

    heading(out, "KOTLIN RUNTIME");
    let kotlin = match (md.kotlin.present, &md.kotlin.version) {
        (true, Some(v)) => format!("present (version {})", v),
        (true, None) => "present (version unknown)".to_string(),
        (false, _) => "not detected".to_string(),
    };
    field(out, "Kotlin", &kotlin);
}

fn permissions(out: &mut String, report: &AnalysisReport) {
    let perms = &report.metadata.permissions;
    heading(out, &format!("PERMISSIONS ({})", perms.len()));
    for p in perms {
        out.push_str(&format!("  {}\n", p));
    }
}

fn features(out: &mut String, report: &AnalysisReport) {
    let features = &report.metadata.features;
    heading(out, &format!("HARDWARE FEATURES ({})", features.len()));
    for f in features {
        let tag = if f.required { "required" } else { "optional" };
        out.push_str(&format!("  {} ({})\n", f.name, tag));
    }
}

fn build_info(out: &mut String, report: &AnalysisReport) {
    let info = &report.metadata.build_info;
    heading(out, "BUILD INFORMATION");
    if info.is_empty() {
        out.push_str("  No build provenance recorded.\n");
    }
    for (k, v) in info {
        out.push_str(&format!("  {}: {}\n", k, v));
    }
}

fn assets_and_resources(out: &mut String, report: &AnalysisReport) {
    let md = &report.metadata;
    heading(out, "ASSETS AND RESOURCES");
    field(out, "Assets", &format!("{} file(s), {}", md.assets.files, format_size(md.assets.bytes)));
    field(
        out,
        "Resources",
        &format!("{} file(s), {}", md.resources.files, format_size(md.resources.bytes)),
    );
    let locales = if md.locales.is_empty() {
        "none".to_string()
    } else {
        format!("{} ({})", md.locales.len(), md.locales.join(", "))
    };
    field(out, "Locales", &locales);
}
