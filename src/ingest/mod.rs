//! Ingestion layer: turn whatever the caller hands us into a package file
//! or a ready-made decompiled tree
//!
//! ```text
//!  .apk ───────────────┐
//!  .xapk/.apks/.apkm ──┼──→ InputKind ──→ split::reconstruct ──→ merged .apk
//!  decompiled dir ─────┘                                      │
//!                                                             ▼
//!                                     decompiler (readable)  +  archive (raw)
//! ```

pub mod archive;
pub mod decompiler;
pub mod split;

use crate::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Container extensions that always denote a split distribution
const SPLIT_EXTENSIONS: &[&str] = &["xapk", "apks", "apkm"];

/// What kind of input the caller supplied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    /// A single installable package
    Package(PathBuf),
    /// A split container (base + config splits)
    SplitContainer(PathBuf),
    /// An already decompiled tree; doubles as the raw tree
    DecompiledTree(PathBuf),
}

impl InputKind {
    /// Detect the input kind from the path
    pub fn detect(path: &Path) -> ProbeResult<Self> {
        if !path.exists() {
            return Err(ProbeError::InvalidInput(format!(
                "Input not found: {}",
                path.display()
            )));
        }

        if path.is_dir() {
            if !path.join(decompiler::MANIFEST_FILE).is_file() {
                return Err(ProbeError::InvalidInput(format!(
                    "Directory {} is not a decompiled package (no {})",
                    path.display(),
                    decompiler::MANIFEST_FILE
                )));
            }
            return Ok(Self::DecompiledTree(path.to_path_buf()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "apk" => Ok(Self::Package(path.to_path_buf())),
            e if SPLIT_EXTENSIONS.contains(&e) => Ok(Self::SplitContainer(path.to_path_buf())),
            "zip" => {
                let has_packages = archive::contains_packages(path)
                    .map_err(ProbeError::InvalidInput)?;
                if has_packages {
                    Ok(Self::SplitContainer(path.to_path_buf()))
                } else {
                    Err(ProbeError::InvalidInput(format!(
                        "{} contains no packages",
                        path.display()
                    )))
                }
            }
            _ => Err(ProbeError::InvalidInput(format!(
                "Unsupported input type: {}",
                path.display()
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Package(p) | Self::SplitContainer(p) | Self::DecompiledTree(p) => p,
        }
    }
}

/// Extract a package as a plain archive, preserving original binary files
pub fn extract_raw(package: &Path, dest: &Path) -> ProbeResult<usize> {
    let stats = archive::extract_into(package, dest).map_err(ProbeError::InvalidInput)?;
    if !stats.rejected.is_empty() {
        tracing::warn!(
            "Raw tree: skipped {} entr{} with unsafe names: {}",
            stats.rejected.len(),
            if stats.rejected.len() == 1 { "y" } else { "ies" },
            stats.rejected.join(", ")
        );
    }
    tracing::info!(
        "Raw tree: {} files, {:.1} MB",
        stats.entries_written,
        stats.bytes_written as f64 / 1_048_576.0
    );
    Ok(stats.entries_written)
}
