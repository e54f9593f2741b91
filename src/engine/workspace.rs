//! Per-run scratch space: merged package, decompiled tree, raw tree
//!
//! An ephemeral workspace is a `TempDir` and disappears when dropped, on
//! success and on error alike. A retained workspace survives the run and
//! its location is logged.

use crate::ProbeResult;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Debug)]
enum Root {
    Ephemeral(TempDir),
    Retained(PathBuf),
}

#[derive(Debug)]
pub struct Workspace {
    root: Root,
}

impl Workspace {
    pub fn create(keep: bool) -> ProbeResult<Self> {
        let dir = tempfile::Builder::new().prefix("sdkprobe-run-").tempdir()?;
        let root = if keep {
            let path = dir.keep();
            tracing::info!("Work directories will be kept at {}", path.display());
            Root::Retained(path)
        } else {
            Root::Ephemeral(dir)
        };
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        match &self.root {
            Root::Ephemeral(dir) => dir.path(),
            Root::Retained(path) => path,
        }
    }

    pub fn is_retained(&self) -> bool {
        matches!(self.root, Root::Retained(_))
    }

    /// Where a reconstructed split container is written
    pub fn merged_package(&self) -> PathBuf {
        self.path().join("merged.apk")
    }

    pub fn decompiled_dir(&self) -> PathBuf {
        self.path().join("decompiled")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.path().join("raw")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.path().join("scratch")
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Root::Retained(path) = &self.root {
            tracing::info!("Kept work directories at {}", path.display());
        }
    }
}
