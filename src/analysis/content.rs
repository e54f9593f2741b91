//! Build provenance, asset/resource accounting, locales and code packages

use crate::engine::file_index::{PackageIndex, TreeArea, RESOURCE_DIR};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

static LOCALE_QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^values-((?:[a-z]{2,3}(?:-r[A-Z]{2})?)|(?:b\+[A-Za-z0-9+]+))(?:-.+)?$").unwrap()
});

/// UI-mode qualifiers that look like language codes
const NON_LOCALE_QUALIFIERS: &[&str] = &["car"];

/// Manifest main-section keys that carry no provenance
const SKIPPED_MF_KEYS: &[&str] = &["Manifest-Version"];

/// Class file extensions in decompiled code trees
const CLASS_EXTENSIONS: &[&str] = &["smali", "java", "kt"];

/// File/byte totals for one area of the package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub files: usize,
    pub bytes: u64,
}

impl ContentSummary {
    fn of(index: &PackageIndex, areas: &[TreeArea]) -> Self {
        let mut s = Self::default();
        for area in areas {
            for f in index.area(*area) {
                s.files += 1;
                s.bytes += f.size;
            }
        }
        s
    }
}

/// A top-level package in the decompiled code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePackage {
    pub name: String,
    pub class_files: usize,
}

pub fn asset_summary(index: &PackageIndex) -> ContentSummary {
    ContentSummary::of(index, &[TreeArea::Asset])
}

pub fn resource_summary(index: &PackageIndex) -> ContentSummary {
    ContentSummary::of(index, &[TreeArea::ResourceXml, TreeArea::Resource])
}

/// Distinct locale qualifiers from `res/values-<locale>` directories
pub fn locales(decompiled_root: &Path) -> Vec<String> {
    let Ok(rd) = std::fs::read_dir(decompiled_root.join(RESOURCE_DIR)) else {
        return Vec::new();
    };
    let set: BTreeSet<String> = rd
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            let caps = LOCALE_QUALIFIER.captures(&name)?;
            let q = caps[1].to_string();
            (!NON_LOCALE_QUALIFIERS.contains(&q.as_str())).then_some(q)
        })
        .collect();
    set.into_iter().collect()
}

/// Every top-level code package with its class-file count, sorted by name.
/// Packages with the same name in several code roots are merged.
pub fn code_packages(index: &PackageIndex) -> Vec<CodePackage> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for f in index.area(TreeArea::Code) {
        let parts: Vec<&str> = f.rel.split('/').collect();
        // <code root>/<package>/.../<File>
        if parts.len() < 3 || !CLASS_EXTENSIONS.contains(&f.extension.as_str()) {
            continue;
        }
        *counts.entry(parts[1].to_string()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(name, class_files)| CodePackage { name, class_files })
        .collect()
}

/// Build provenance key/value pairs from `META-INF/MANIFEST.MF` and
/// `kotlin-tooling-metadata.json`, merged over `base`
pub fn build_provenance(
    index: &PackageIndex,
    base: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut out = base.clone();

    if let Some(dir) = index.metadata_dir() {
        if let Ok(text) = std::fs::read_to_string(dir.join("MANIFEST.MF")) {
            for (k, v) in manifest_mf_main_section(&text) {
                out.insert(k, v);
            }
        }
    }

    if let Ok(text) = std::fs::read_to_string(index.raw_root().join("kotlin-tooling-metadata.json")) {
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(json) => {
                for key in ["buildSystem", "buildSystemVersion", "buildPlugin", "buildPluginVersion"] {
                    if let Some(v) = json.get(key).and_then(|v| v.as_str()) {
                        out.insert(format!("kotlin.{}", key), v.to_string());
                    }
                }
            }
            Err(e) => tracing::debug!("Ignoring malformed kotlin-tooling-metadata.json: {}", e),
        }
    }

    out
}

/// Key/value pairs of the main section (everything before the first blank line)
fn manifest_mf_main_section(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(|l| l.trim_end_matches('\r'))
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| {
            let (k, v) = l.split_once(':')?;
            let k = k.trim();
            (!SKIPPED_MF_KEYS.contains(&k)).then(|| (k.to_string(), v.trim().to_string()))
        })
        .collect()
}
