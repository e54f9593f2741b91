//! Split-package reconstruction: one installable package out of a
//! base + architecture + configuration split container
//!
//! Merge order is fixed: base, then architecture splits, then every other
//! split. Later writers win on path collisions; real content conflicts are
//! logged and reported in [`MergeOutcome::collisions`].

use super::archive;
use crate::{ProbeError, ProbeResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

static CONFIG_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[._])config\.[^/\\]+\.apk$").unwrap()
});

static ARCH_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(arm64[_-]v8a|armeabi[_-]v7a|armeabi|x86[_-]64|x86|mips64|mips)").unwrap()
});

/// Role a sub-package plays inside a split container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitRole {
    Base,
    Architecture,
    Config,
}

/// Classify a sub-package by its file name. Returns `None` for non-package entries.
pub fn classify(file_name: &str) -> Option<SplitRole> {
    if !file_name.to_lowercase().ends_with(".apk") {
        return None;
    }
    if CONFIG_SPLIT.is_match(file_name) {
        if ARCH_SPLIT.is_match(file_name) {
            Some(SplitRole::Architecture)
        } else {
            Some(SplitRole::Config)
        }
    } else {
        Some(SplitRole::Base)
    }
}

/// A path overwritten with different content by a later split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeCollision {
    pub path: PathBuf,
    pub overwritten_by: String,
}

/// Result of a successful reconstruction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub output: PathBuf,
    pub output_bytes: u64,
    pub base: String,
    pub architecture_splits: Vec<String>,
    pub config_splits: Vec<String>,
    pub entries_written: usize,
    pub collisions: Vec<MergeCollision>,
    /// Entries skipped because their names escape the extraction root
    pub rejected_entries: Vec<String>,
}

/// Sub-packages found in an unpacked container, in merge order
#[derive(Debug, Clone)]
struct SplitPlan {
    base: PathBuf,
    architecture: Vec<PathBuf>,
    others: Vec<PathBuf>,
}

impl SplitPlan {
    fn from_dir(root: &Path) -> ProbeResult<Self> {
        let mut bases = Vec::new();
        let mut architecture = Vec::new();
        let mut others = Vec::new();

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let name = entry.file_name().to_string_lossy().to_string();
            match classify(&name) {
                Some(SplitRole::Base) => bases.push(entry.path().to_path_buf()),
                Some(SplitRole::Architecture) => architecture.push(entry.path().to_path_buf()),
                Some(SplitRole::Config) => others.push(entry.path().to_path_buf()),
                None => {}
            }
        }

        if bases.is_empty() {
            return Err(ProbeError::NoBaseArchiveFound);
        }

        // Prefer the conventional base.apk; remaining non-config packages
        // (feature splits) merge after the configuration splits.
        let base_idx = bases
            .iter()
            .position(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().eq_ignore_ascii_case("base.apk"))
                    .unwrap_or(false)
            })
            .unwrap_or(0);
        let base = bases.remove(base_idx);
        others.extend(bases);

        Ok(Self { base, architecture, others })
    }
}

/// Reconstructs split containers. Scratch space lives under `scratch_root`
/// (the system temp dir by default) and is removed on every exit path.
#[derive(Debug, Clone, Default)]
pub struct SplitMerger {
    scratch_root: Option<PathBuf>,
}

impl SplitMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scratch_root(root: impl Into<PathBuf>) -> Self {
        Self { scratch_root: Some(root.into()) }
    }

    /// Merge `container` into a single package written to `output`.
    ///
    /// The package is assembled in scratch space and only moved to `output`
    /// once complete, so a failed merge never touches `output`.
    pub fn merge(&self, container: &Path, output: &Path) -> ProbeResult<MergeOutcome> {
        if !container.is_file() {
            return Err(ProbeError::InvalidInput(format!(
                "Split container not found: {}",
                container.display()
            )));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("sdkprobe-merge-");
        let scratch = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        // `scratch` drops on both paths
        merge_in(scratch.path(), container, output)
    }
}

/// Reconstruct `container` into `output` using the system temp dir
pub fn reconstruct(container: &Path, output: &Path) -> ProbeResult<MergeOutcome> {
    SplitMerger::new().merge(container, output)
}

fn merge_in(scratch: &Path, container: &Path, output: &Path) -> ProbeResult<MergeOutcome> {
    let unpacked = scratch.join("container");
    let staging = scratch.join("staging");

    let container_stats = archive::extract_into(container, &unpacked)
        .map_err(ProbeError::SplitPackageExtractionFailed)?;
    let mut rejected_entries = container_stats.rejected;

    let plan = SplitPlan::from_dir(&unpacked)?;
    let base_name = display_name(&plan.base);
    tracing::info!(
        "Split container: base={}, {} architecture split(s), {} other split(s)",
        base_name,
        plan.architecture.len(),
        plan.others.len()
    );

    let base_stats = archive::extract_into(&plan.base, &staging)
        .map_err(ProbeError::BasePackageExtractionFailed)?;
    rejected_entries.extend(base_stats.rejected);

    let mut collisions = Vec::new();
    for split in plan.architecture.iter().chain(plan.others.iter()) {
        let name = display_name(split);
        let stats = archive::extract_into(split, &staging)
            .map_err(|e| ProbeError::SplitPackageExtractionFailed(format!("{}: {}", name, e)))?;
        for path in stats.overwritten {
            tracing::warn!("Merge collision: {} overwritten by {}", path.display(), name);
            collisions.push(MergeCollision { path, overwritten_by: name.clone() });
        }
        rejected_entries.extend(stats.rejected);
        tracing::debug!("Merged {} ({} entries)", name, stats.entries_written);
    }

    if !rejected_entries.is_empty() {
        tracing::warn!(
            "Skipped {} entr{} with unsafe names",
            rejected_entries.len(),
            if rejected_entries.len() == 1 { "y" } else { "ies" }
        );
    }

    let assembled = scratch.join("merged.apk");
    let entries_written = archive::compress_dir(&staging, &assembled)
        .map_err(ProbeError::RepackagingFailed)?;

    let output_bytes = fs::metadata(&assembled).map(|m| m.len()).unwrap_or(0);
    if output_bytes == 0 {
        return Err(ProbeError::RepackagingFailed(format!(
            "Merged package {} is missing or empty",
            assembled.display()
        )));
    }
    publish(&assembled, output)?;

    tracing::info!(
        "Reconstructed {} ({} entries, {} bytes, {} collisions)",
        output.display(),
        entries_written,
        output_bytes,
        collisions.len()
    );

    Ok(MergeOutcome {
        output: output.to_path_buf(),
        output_bytes,
        base: base_name,
        architecture_splits: plan.architecture.iter().map(|p| display_name(p)).collect(),
        config_splits: plan.others.iter().map(|p| display_name(p)).collect(),
        entries_written,
        collisions,
        rejected_entries,
    })
}

/// Move a finished package into place. The copy goes through a temporary
/// sibling of `output` that is renamed over it, so `output` is either the
/// previous file or the complete new one.
fn publish(assembled: &Path, output: &Path) -> ProbeResult<()> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let failed = |e: std::io::Error| ProbeError::RepackagingFailed(format!("{}: {}", output.display(), e));

    fs::create_dir_all(&parent).map_err(failed)?;
    let mut staged = tempfile::Builder::new()
        .prefix(".sdkprobe-merged-")
        .tempfile_in(&parent)
        .map_err(failed)?;
    let mut src = fs::File::open(assembled).map_err(failed)?;
    std::io::copy(&mut src, staged.as_file_mut()).map_err(failed)?;
    staged.persist(output).map_err(|e| failed(e.error))?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_split_names() {
        assert_eq!(classify("base.apk"), Some(SplitRole::Base));
        assert_eq!(classify("com.example.app.apk"), Some(SplitRole::Base));
        assert_eq!(classify("split_config.arm64_v8a.apk"), Some(SplitRole::Architecture));
        assert_eq!(classify("config.armeabi_v7a.apk"), Some(SplitRole::Architecture));
        assert_eq!(classify("config.x86_64.apk"), Some(SplitRole::Architecture));
        assert_eq!(classify("split_config.en.apk"), Some(SplitRole::Config));
        assert_eq!(classify("config.xxhdpi.apk"), Some(SplitRole::Config));
        assert_eq!(classify("icon.png"), None);
        assert_eq!(classify("manifest.json"), None);
    }

    #[test]
    fn test_plan_prefers_base_apk() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("a_feature.apk"), b"x").unwrap();
        fs::write(dir.path().join("base.apk"), b"x").unwrap();
        fs::write(dir.path().join("split_config.de.apk"), b"x").unwrap();

        let plan = SplitPlan::from_dir(dir.path()).unwrap();
        assert_eq!(display_name(&plan.base), "base.apk");
        let others: Vec<_> = plan.others.iter().map(|p| display_name(p)).collect();
        assert_eq!(others, vec!["split_config.de.apk", "a_feature.apk"]);
    }

    #[test]
    fn test_plan_without_base_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("split_config.arm64_v8a.apk"), b"x").unwrap();
        assert!(matches!(
            SplitPlan::from_dir(dir.path()),
            Err(ProbeError::NoBaseArchiveFound)
        ));
    }
}
