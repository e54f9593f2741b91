//! Decoded manifest parsing: identity, permissions, hardware features
//!
//! apktool moves version and SDK levels out of the manifest into
//! `apktool.yml`, so those fields fall back to that file.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const UNKNOWN: &str = "unknown";

static MANIFEST_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<manifest\b([^>]*)>").unwrap());
static APPLICATION_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<application\b([^>]*)>").unwrap());
static USES_SDK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<uses-sdk\b([^>]*)>").unwrap());
static PERMISSION_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<uses-permission(?:-sdk-23)?\b([^>]*)>").unwrap()
});
static FEATURE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<uses-feature\b([^>]*)>").unwrap());
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([\w:.-]+)\s*=\s*"([^"]*)""#).unwrap());

/// Identity and platform configuration of the app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifestFacts {
    pub package_id: String,
    pub display_name: String,
    pub version_name: String,
    pub version_code: String,
    pub min_sdk: String,
    pub target_sdk: String,
}

impl Default for PackageManifestFacts {
    fn default() -> Self {
        Self {
            package_id: UNKNOWN.to_string(),
            display_name: UNKNOWN.to_string(),
            version_name: UNKNOWN.to_string(),
            version_code: UNKNOWN.to_string(),
            min_sdk: UNKNOWN.to_string(),
            target_sdk: UNKNOWN.to_string(),
        }
    }
}

impl PackageManifestFacts {
    pub fn has_package_id(&self) -> bool {
        self.package_id != UNKNOWN
    }

    pub fn has_display_name(&self) -> bool {
        self.display_name != UNKNOWN
    }
}

/// A declared hardware/software feature
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HardwareFeature {
    pub name: String,
    pub required: bool,
}

/// Everything pulled out of the manifest in one pass
#[derive(Debug, Clone, Default)]
pub struct ManifestInfo {
    pub facts: PackageManifestFacts,
    pub permissions: Vec<String>,
    pub features: Vec<HardwareFeature>,
    /// Build-related attributes on the `<manifest>` tag
    pub build_attributes: BTreeMap<String, String>,
}

/// Parse a decoded manifest. `res_dir` resolves `@string/` labels, `apktool_yml`
/// supplies version and SDK levels the manifest no longer carries.
pub fn parse(text: &str, res_dir: Option<&Path>, apktool_yml: Option<&str>) -> ManifestInfo {
    let mut info = ManifestInfo::default();
    let yml = apktool_yml.map(ApktoolYml::parse).unwrap_or_default();

    if let Some(caps) = MANIFEST_TAG.captures(text) {
        let attrs = attributes(&caps[1]);
        if let Some(pkg) = attrs.get("package") {
            info.facts.package_id = pkg.clone();
        }
        if let Some(v) = attrs.get("android:versionName") {
            info.facts.version_name = v.clone();
        }
        if let Some(v) = attrs.get("android:versionCode") {
            info.facts.version_code = v.clone();
        }
        for key in [
            "platformBuildVersionName",
            "platformBuildVersionCode",
            "android:compileSdkVersion",
            "android:compileSdkVersionCodename",
        ] {
            if let Some(v) = attrs.get(key) {
                let name = key.trim_start_matches("android:");
                info.build_attributes.insert(name.to_string(), v.clone());
            }
        }
    }

    if let Some(caps) = USES_SDK_TAG.captures(text) {
        let attrs = attributes(&caps[1]);
        if let Some(v) = attrs.get("android:minSdkVersion") {
            info.facts.min_sdk = v.clone();
        }
        if let Some(v) = attrs.get("android:targetSdkVersion") {
            info.facts.target_sdk = v.clone();
        }
    }

    let version_info = yml.version_info.unwrap_or_default();
    let sdk_info = yml.sdk_info.unwrap_or_default();
    fill_unknown(&mut info.facts.version_name, scalar(version_info.version_name));
    fill_unknown(&mut info.facts.version_code, scalar(version_info.version_code));
    fill_unknown(&mut info.facts.min_sdk, scalar(sdk_info.min_sdk_version));
    fill_unknown(&mut info.facts.target_sdk, scalar(sdk_info.target_sdk_version));
    if let Some(v) = scalar(yml.version) {
        info.build_attributes.insert("apktool".to_string(), v);
    }

    if let Some(caps) = APPLICATION_TAG.captures(text) {
        let attrs = attributes(&caps[1]);
        if let Some(label) = attrs.get("android:label") {
            if let Some(name) = resolve_label(label, res_dir) {
                info.facts.display_name = name;
            }
        }
    }

    let mut permissions: Vec<String> = PERMISSION_TAG
        .captures_iter(text)
        .filter_map(|c| attributes(&c[1]).get("android:name").cloned())
        .collect();
    permissions.sort();
    permissions.dedup();
    info.permissions = permissions;

    let mut features: Vec<HardwareFeature> = FEATURE_TAG
        .captures_iter(text)
        .filter_map(|c| {
            let attrs = attributes(&c[1]);
            let name = attrs.get("android:name")?.clone();
            let required = attrs
                .get("android:required")
                .map(|v| v != "false")
                .unwrap_or(true);
            Some(HardwareFeature { name, required })
        })
        .collect();
    features.sort();
    features.dedup();
    info.features = features;

    info
}

fn fill_unknown(slot: &mut String, fallback: Option<String>) {
    if slot == UNKNOWN {
        if let Some(v) = fallback {
            *slot = v;
        }
    }
}

fn attributes(tag_body: &str) -> BTreeMap<String, String> {
    ATTRIBUTE
        .captures_iter(tag_body)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}

/// The parts of apktool.yml that carry identity apktool lifted out of the manifest
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApktoolYml {
    version: Option<serde_yaml::Value>,
    sdk_info: Option<SdkInfo>,
    version_info: Option<VersionInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SdkInfo {
    min_sdk_version: Option<serde_yaml::Value>,
    target_sdk_version: Option<serde_yaml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo {
    version_code: Option<serde_yaml::Value>,
    version_name: Option<serde_yaml::Value>,
}

impl ApktoolYml {
    /// Unreadable files yield no fallbacks. apktool writes a
    /// `!!brut.androlib.meta.MetaInfo` tag line first, which is dropped.
    fn parse(text: &str) -> Self {
        let body: String = text
            .lines()
            .filter(|l| !l.trim_start().starts_with("!!"))
            .map(|l| format!("{}\n", l))
            .collect();
        match serde_yaml::from_str(&body) {
            Ok(yml) => yml,
            Err(e) => {
                tracing::debug!("apktool.yml not usable: {}", e);
                Self::default()
            }
        }
    }
}

/// Render a YAML scalar as text; quoted and bare numbers read the same
fn scalar(value: Option<serde_yaml::Value>) -> Option<String> {
    let text = match value? {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn resolve_label(label: &str, res_dir: Option<&Path>) -> Option<String> {
    let Some(key) = label.strip_prefix("@string/") else {
        return (!label.starts_with('@')).then(|| label.to_string());
    };
    let strings = std::fs::read_to_string(res_dir?.join("values").join("strings.xml")).ok()?;
    let pattern = format!(
        r#"<string\s+name="{}"[^>]*>([^<]*)</string>"#,
        regex::escape(key)
    );
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(&strings)?[1].trim().to_string();
    (!value.is_empty()).then_some(value)
}
