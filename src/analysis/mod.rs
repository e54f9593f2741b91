//! Metadata extraction: structured facts about the package
//!
//! Every facet is best-effort: a missing manifest, stamp directory or
//! resource directory yields an empty value for that facet only. Only a
//! missing manifest is worth a warning, since identity then falls back to
//! `unknown` placeholders.

pub mod content;
pub mod manifest;
pub mod stamps;

pub use content::{CodePackage, ContentSummary};
pub use manifest::{HardwareFeature, PackageManifestFacts};
pub use stamps::{KotlinRuntime, VersionStamp};

use crate::engine::file_index::{PackageIndex, RESOURCE_DIR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All metadata facets of one package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub facts: PackageManifestFacts,
    pub version_stamps: Vec<VersionStamp>,
    pub permissions: Vec<String>,
    pub features: Vec<HardwareFeature>,
    pub build_info: BTreeMap<String, String>,
    pub kotlin: KotlinRuntime,
    pub assets: ContentSummary,
    pub resources: ContentSummary,
    pub locales: Vec<String>,
    pub code_packages: Vec<CodePackage>,
}

/// Extract every facet from the indexed trees
pub fn extract(index: &PackageIndex) -> PackageMetadata {
    let manifest_path = index.manifest_path();
    let manifest_text = match std::fs::read_to_string(&manifest_path) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(
                "Manifest unavailable at {} ({}); identity defaults to 'unknown'",
                manifest_path.display(),
                e
            );
            String::new()
        }
    };
    let apktool_yml = std::fs::read_to_string(index.decompiled_root().join("apktool.yml")).ok();
    let res_dir = index.decompiled_root().join(RESOURCE_DIR);

    let info = manifest::parse(
        &manifest_text,
        res_dir.is_dir().then_some(res_dir.as_path()),
        apktool_yml.as_deref(),
    );

    let metadata_dir = index.metadata_dir();
    let version_stamps = stamps::read_version_stamps(metadata_dir.as_deref());
    let kotlin = stamps::detect_kotlin(index.raw_root(), metadata_dir.as_deref(), &version_stamps);
    let build_info = content::build_provenance(index, &info.build_attributes);

    let metadata = PackageMetadata {
        facts: info.facts,
        version_stamps,
        permissions: info.permissions,
        features: info.features,
        build_info,
        kotlin,
        assets: content::asset_summary(index),
        resources: content::resource_summary(index),
        locales: content::locales(index.decompiled_root()),
        code_packages: content::code_packages(index),
    };

    tracing::info!(
        "Metadata: package={}, {} version stamp(s), {} permission(s), {} feature(s), {} locale(s)",
        metadata.facts.package_id,
        metadata.version_stamps.len(),
        metadata.permissions.len(),
        metadata.features.len(),
        metadata.locales.len()
    );
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_from_empty_tree_is_all_defaults() {
        let dir = TempDir::new().unwrap();
        let idx = PackageIndex::build(dir.path(), dir.path());
        let md = extract(&idx);
        assert_eq!(md.facts, PackageManifestFacts::default());
        assert!(md.version_stamps.is_empty());
        assert!(md.locales.is_empty());
        assert_eq!(md.assets, ContentSummary::default());
        assert!(!md.kotlin.present);
    }
}
