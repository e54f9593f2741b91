//! Bundled library version stamps and Kotlin runtime detection
//!
//! AndroidX, Jetpack and many vendor SDKs ship `META-INF/<group>_<artifact>.version`
//! files holding a single version string.

use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

/// A version stamp for one bundled library
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionStamp {
    pub library: String,
    pub version: String,
}

/// Kotlin runtime presence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KotlinRuntime {
    pub present: bool,
    pub version: Option<String>,
}

/// Read every `*.version` file directly under the metadata directory
pub fn read_version_stamps(metadata_dir: Option<&Path>) -> Vec<VersionStamp> {
    let Some(dir) = metadata_dir else {
        return Vec::new();
    };

    let mut stamps: Vec<VersionStamp> = WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("version"))
        .filter_map(|e| {
            let library = e.path().file_stem()?.to_string_lossy().to_string();
            let content = std::fs::read_to_string(e.path()).ok()?;
            let version = content
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())?
                .to_string();
            Some(VersionStamp { library, version })
        })
        .collect();

    stamps.sort();
    stamps.dedup_by(|a, b| a.library == b.library);
    stamps
}

/// Detect the Kotlin runtime from the raw tree and known stamps
pub fn detect_kotlin(raw_root: &Path, metadata_dir: Option<&Path>, stamps: &[VersionStamp]) -> KotlinRuntime {
    let has_kotlin_dir = raw_root.join("kotlin").is_dir();
    let has_module_file = metadata_dir
        .and_then(|d| std::fs::read_dir(d).ok())
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .any(|e| e.file_name().to_string_lossy().ends_with(".kotlin_module"))
        })
        .unwrap_or(false);

    let stamped = stamps
        .iter()
        .find(|s| {
            let l = s.library.to_lowercase();
            l.contains("kotlin-stdlib") || l.contains("kotlin_stdlib")
        })
        .map(|s| s.version.clone());

    let version = stamped.or_else(|| tooling_plugin_version(raw_root));
    let present = has_kotlin_dir || has_module_file || version.is_some();

    KotlinRuntime { present, version }
}

/// `buildPluginVersion` from `kotlin-tooling-metadata.json`
fn tooling_plugin_version(raw_root: &Path) -> Option<String> {
    let text = std::fs::read_to_string(raw_root.join("kotlin-tooling-metadata.json")).ok()?;
    let json: serde_json::Value = serde_json::from_str(&text).ok()?;
    json.get("buildPluginVersion")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_stamps_sorted_and_trimmed() {
        let dir = TempDir::new().unwrap();
        let meta = dir.path().join("META-INF");
        fs::create_dir_all(&meta).unwrap();
        fs::write(meta.join("androidx.core_core.version"), "\n1.12.0\n").unwrap();
        fs::write(meta.join("androidx.activity_activity.version"), "1.8.0").unwrap();
        fs::write(meta.join("MANIFEST.MF"), "Manifest-Version: 1.0").unwrap();
        fs::write(meta.join("empty.version"), "   \n").unwrap();

        let stamps = read_version_stamps(Some(&meta));
        assert_eq!(stamps.len(), 2);
        assert_eq!(stamps[0].library, "androidx.activity_activity");
        assert_eq!(stamps[1].version, "1.12.0");
        assert!(read_version_stamps(None).is_empty());
    }

    #[test]
    fn test_kotlin_detection_sources() {
        let dir = TempDir::new().unwrap();
        assert!(!detect_kotlin(dir.path(), None, &[]).present);

        fs::write(
            dir.path().join("kotlin-tooling-metadata.json"),
            r#"{"buildSystem":"Gradle","buildPluginVersion":"1.9.22"}"#,
        )
        .unwrap();
        let k = detect_kotlin(dir.path(), None, &[]);
        assert!(k.present);
        assert_eq!(k.version.as_deref(), Some("1.9.22"));

        let stamps = vec![VersionStamp {
            library: "kotlin-stdlib".into(),
            version: "2.0.0".into(),
        }];
        assert_eq!(detect_kotlin(dir.path(), None, &stamps).version.as_deref(), Some("2.0.0"));
    }
}
