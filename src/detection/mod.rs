//! Library inventory: native libraries, aggregated SDK list, competitor hits
//!
//! In inventory mode every native library under `lib/<abi>/` is enumerated
//! unconditionally and enriched from the reference database.

pub mod competitors;
pub mod library_db;

use crate::analysis::VersionStamp;
use crate::engine::file_index::{PackageIndex, TreeArea};
use library_db::LibraryDb;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One native binary shipped in the package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeLibraryRecord {
    pub name: String,
    /// ABI directory, e.g. `arm64-v8a`
    pub architecture: String,
    /// Path relative to the raw tree
    pub path: String,
    pub size: u64,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub version: Option<String>,
}

/// A native library whose name resembles a known competitor product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorMatch {
    pub library_name: String,
    pub library_path: String,
    pub library_size: u64,
    pub competitor: String,
}

/// Where an aggregated SDK entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdkSource {
    VersionStamp,
    NativeLibrary,
}

/// One entry of the "all detected SDKs" list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedSdk {
    pub name: String,
    pub version: Option<String>,
    pub vendor: Option<String>,
    pub source: SdkSource,
}

/// Enumerate every native library file, sorted by architecture then name
pub fn inventory_native_libraries(index: &PackageIndex, db: &LibraryDb) -> Vec<NativeLibraryRecord> {
    let mut records: Vec<NativeLibraryRecord> = index
        .area(TreeArea::NativeLibrary)
        .into_iter()
        .map(|f| {
            // lib/<abi>/<name>; anything deeper keeps its first directory as the ABI
            let architecture = f.rel.split('/').nth(1).filter(|_| f.rel.matches('/').count() >= 2);
            let entry = db.lookup(&f.name);
            NativeLibraryRecord {
                name: f.name.clone(),
                architecture: architecture.unwrap_or("").to_string(),
                path: f.rel.clone(),
                size: f.size,
                description: entry.and_then(|e| e.description.clone()),
                vendor: entry.and_then(|e| e.vendor.clone()),
                version: entry.and_then(|e| e.version.clone()),
            }
        })
        .collect();

    records.sort_by(|a, b| {
        (a.architecture.as_str(), a.name.as_str(), a.path.as_str())
            .cmp(&(b.architecture.as_str(), b.name.as_str(), b.path.as_str()))
    });
    records.dedup_by(|a, b| a.name == b.name && a.path == b.path);

    tracing::info!(
        "Native libraries: {} file(s), {} with reference data",
        records.len(),
        records.iter().filter(|r| r.description.is_some() || r.vendor.is_some()).count()
    );
    records
}

/// Merge version-stamped dependencies and vendor-attributed native libraries
/// into one alphabetical list, one entry per name (case-insensitive)
pub fn aggregate_sdks(stamps: &[VersionStamp], libraries: &[NativeLibraryRecord]) -> Vec<DetectedSdk> {
    let mut by_key: BTreeMap<String, DetectedSdk> = BTreeMap::new();

    for s in stamps {
        by_key.entry(s.library.to_lowercase()).or_insert_with(|| DetectedSdk {
            name: s.library.clone(),
            version: Some(s.version.clone()),
            vendor: None,
            source: SdkSource::VersionStamp,
        });
    }

    for lib in libraries {
        let Some(vendor) = &lib.vendor else { continue };
        let name = lib.description.clone().unwrap_or_else(|| lib.name.clone());
        by_key.entry(name.to_lowercase()).or_insert_with(|| DetectedSdk {
            name,
            version: lib.version.clone(),
            vendor: Some(vendor.clone()),
            source: SdkSource::NativeLibrary,
        });
    }

    by_key.into_values().collect()
}

/// Distinct ABI directories, sorted
pub fn architectures(libraries: &[NativeLibraryRecord]) -> Vec<String> {
    let mut archs: Vec<String> = libraries
        .iter()
        .map(|l| l.architecture.clone())
        .filter(|a| !a.is_empty())
        .collect();
    archs.sort();
    archs.dedup();
    archs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &std::path::Path, rel: &str, content: &[u8]) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, content).unwrap();
    }

    #[test]
    fn test_inventory_enriches_and_sorts() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "lib/x86_64/libpspdfkit.so", b"1234");
        touch(dir.path(), "lib/arm64-v8a/libpspdfkit.so", b"12");
        touch(dir.path(), "lib/arm64-v8a/libc++_shared.so", b"1");
        let idx = PackageIndex::build(dir.path(), dir.path());
        let db = LibraryDb::parse("libpspdfkit|PSPDFKit PDF SDK|PSPDFKit GmbH|2024.1\n");

        let libs = inventory_native_libraries(&idx, &db);
        assert_eq!(libs.len(), 3);
        assert_eq!(libs[0].path, "lib/arm64-v8a/libc++_shared.so");
        assert_eq!(libs[1].architecture, "arm64-v8a");
        assert_eq!(libs[1].vendor.as_deref(), Some("PSPDFKit GmbH"));
        assert_eq!(libs[2].architecture, "x86_64");
        assert_eq!(libs[2].size, 4);
        assert_eq!(architectures(&libs), vec!["arm64-v8a", "x86_64"]);
    }

    #[test]
    fn test_aggregate_sdks_dedupes_and_sorts() {
        let stamps = vec![
            VersionStamp { library: "androidx.core_core".into(), version: "1.12.0".into() },
            VersionStamp { library: "Zebra_sdk".into(), version: "3".into() },
        ];
        let lib = |name: &str, vendor: Option<&str>| NativeLibraryRecord {
            name: name.into(),
            architecture: "arm64-v8a".into(),
            path: format!("lib/arm64-v8a/{}", name),
            size: 1,
            description: Some("PSPDFKit PDF SDK".into()),
            vendor: vendor.map(str::to_string),
            version: None,
        };
        let libs = vec![
            lib("libpspdfkit.so", Some("PSPDFKit GmbH")),
            lib("libpspdfkit2.so", Some("PSPDFKit GmbH")),
            lib("libnovendor.so", None),
        ];

        let sdks = aggregate_sdks(&stamps, &libs);
        let names: Vec<_> = sdks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["androidx.core_core", "PSPDFKit PDF SDK", "Zebra_sdk"]);
        assert_eq!(sdks[1].source, SdkSource::NativeLibrary);
    }
}
