//! Single-pass package indexing: walk each tree once, serve every consumer
//!
//! The decompiled tree provides the readable manifest, decoded resources and
//! code; the raw tree provides native libraries, assets and library metadata
//! exactly as shipped. Both walks are sorted by file name, so every list the
//! index hands out is in a stable order.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "AndroidManifest.xml";
pub const RESOURCE_DIR: &str = "res";
pub const NATIVE_LIB_DIR: &str = "lib";
pub const ASSETS_DIR: &str = "assets";
pub const METADATA_DIR: &str = "META-INF";

/// A single indexed file with pre-computed metadata
#[derive(Debug, Clone)]
pub struct IndexedFile {
    pub path: PathBuf,
    /// Path relative to the tree it was found in, `/`-separated
    pub rel: String,
    pub name: String,
    pub extension: String,
    pub size: u64,
}

impl IndexedFile {
    pub fn name_lower(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Where in the package a file lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeArea {
    Manifest,
    ResourceXml,
    Resource,
    Code,
    NativeLibrary,
    Asset,
    LibraryMetadata,
    Other,
}

/// Pre-built index of the decompiled and raw trees of one package
#[derive(Debug, Clone)]
pub struct PackageIndex {
    pub files: Vec<IndexedFile>,
    pub by_area: HashMap<TreeArea, Vec<usize>>,
    pub total_bytes: u64,
    decompiled_root: PathBuf,
    raw_root: PathBuf,
    present: HashSet<TreeArea>,
}

impl PackageIndex {
    /// Walk both trees and build the index. When both roots are the same
    /// directory it is walked once.
    pub fn build(decompiled_root: &Path, raw_root: &Path) -> Self {
        let same_tree = decompiled_root == raw_root;
        let raw_has_metadata = raw_root.join(METADATA_DIR).is_dir();

        let mut files = Vec::new();
        let mut areas = Vec::new();
        let mut total_bytes = 0u64;

        for file in walk(decompiled_root) {
            let mut cat = classify_decompiled(&file.rel, raw_has_metadata);
            if same_tree && cat == TreeArea::Other {
                cat = classify_raw(&file.rel);
            }
            total_bytes += file.size;
            files.push(file);
            areas.push(cat);
        }

        if !same_tree {
            for file in walk(raw_root) {
                let cat = classify_raw(&file.rel);
                total_bytes += file.size;
                files.push(file);
                areas.push(cat);
            }
        }

        let mut by_area: HashMap<TreeArea, Vec<usize>> = HashMap::new();
        for (idx, area) in areas.into_iter().enumerate() {
            by_area.entry(area).or_default().push(idx);
        }

        let mut present = HashSet::new();
        if decompiled_root.join(MANIFEST_FILE).is_file() {
            present.insert(TreeArea::Manifest);
        }
        if decompiled_root.join(RESOURCE_DIR).is_dir() {
            present.insert(TreeArea::ResourceXml);
            present.insert(TreeArea::Resource);
        }
        if !code_roots(decompiled_root).is_empty() {
            present.insert(TreeArea::Code);
        }
        if raw_root.join(NATIVE_LIB_DIR).is_dir() {
            present.insert(TreeArea::NativeLibrary);
        }
        if raw_root.join(ASSETS_DIR).is_dir() {
            present.insert(TreeArea::Asset);
        }
        if raw_has_metadata || decompiled_root.join("original").join(METADATA_DIR).is_dir() {
            present.insert(TreeArea::LibraryMetadata);
        }

        tracing::info!(
            "PackageIndex: {} files, {:.1} MB ({} code, {} native, {} resource XML)",
            files.len(),
            total_bytes as f64 / 1_048_576.0,
            by_area.get(&TreeArea::Code).map_or(0, Vec::len),
            by_area.get(&TreeArea::NativeLibrary).map_or(0, Vec::len),
            by_area.get(&TreeArea::ResourceXml).map_or(0, Vec::len),
        );

        Self {
            files,
            by_area,
            total_bytes,
            decompiled_root: decompiled_root.to_path_buf(),
            raw_root: raw_root.to_path_buf(),
            present,
        }
    }

    /// All files in an area, in walk order
    pub fn area(&self, area: TreeArea) -> Vec<&IndexedFile> {
        self.by_area
            .get(&area)
            .map(|ids| ids.iter().map(|&i| &self.files[i]).collect())
            .unwrap_or_default()
    }

    /// Whether the directory (or file) backing an area exists at all
    pub fn has_area(&self, area: TreeArea) -> bool {
        self.present.contains(&area)
    }

    pub fn decompiled_root(&self) -> &Path {
        &self.decompiled_root
    }

    pub fn raw_root(&self) -> &Path {
        &self.raw_root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.decompiled_root.join(MANIFEST_FILE)
    }

    /// Library metadata directory: raw `META-INF/`, else the decompiler's copy
    pub fn metadata_dir(&self) -> Option<PathBuf> {
        let raw = self.raw_root.join(METADATA_DIR);
        if raw.is_dir() {
            return Some(raw);
        }
        let copy = self.decompiled_root.join("original").join(METADATA_DIR);
        copy.is_dir().then_some(copy)
    }

    pub fn total_files(&self) -> usize {
        self.files.len()
    }
}

/// Top-level decompiled code directories (`smali`, `smali_classes2`, `sources`, ...)
pub fn code_roots(decompiled_root: &Path) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = std::fs::read_dir(decompiled_root)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .filter(|e| is_code_root(&e.file_name().to_string_lossy()))
                .map(|e| e.path())
                .collect()
        })
        .unwrap_or_default();
    roots.sort();
    roots
}

fn is_code_root(name: &str) -> bool {
    name.starts_with("smali") || name == "sources"
}

fn walk(root: &Path) -> Vec<IndexedFile> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(root).ok()?;
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let name = entry.file_name().to_string_lossy().to_string();
            let extension = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            Some(IndexedFile {
                path: entry.path().to_path_buf(),
                rel,
                name,
                extension,
                size,
            })
        })
        .collect()
}

fn classify_decompiled(rel: &str, raw_has_metadata: bool) -> TreeArea {
    if rel == MANIFEST_FILE {
        return TreeArea::Manifest;
    }
    let mut parts = rel.split('/');
    let top = parts.next().unwrap_or("");
    match top {
        RESOURCE_DIR if rel.to_lowercase().ends_with(".xml") => TreeArea::ResourceXml,
        RESOURCE_DIR => TreeArea::Resource,
        t if is_code_root(t) && rel.contains('/') => TreeArea::Code,
        "original" if !raw_has_metadata && parts.next() == Some(METADATA_DIR) => {
            TreeArea::LibraryMetadata
        }
        _ => TreeArea::Other,
    }
}

fn classify_raw(rel: &str) -> TreeArea {
    if !rel.contains('/') {
        return TreeArea::Other;
    }
    match rel.split('/').next().unwrap_or("") {
        NATIVE_LIB_DIR => TreeArea::NativeLibrary,
        ASSETS_DIR => TreeArea::Asset,
        METADATA_DIR => TreeArea::LibraryMetadata,
        _ => TreeArea::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, content).unwrap();
    }

    #[test]
    fn test_separate_trees_are_classified_by_origin() {
        let dec = TempDir::new().unwrap();
        let raw = TempDir::new().unwrap();
        touch(dec.path(), "AndroidManifest.xml", "<manifest/>");
        touch(dec.path(), "res/values/strings.xml", "<resources/>");
        touch(dec.path(), "res/drawable/icon.png", "");
        touch(dec.path(), "smali/com/a/B.smali", ".class");
        touch(dec.path(), "smali_classes2/com/c/D.smali", ".class");
        touch(raw.path(), "AndroidManifest.xml", "binary");
        touch(raw.path(), "lib/arm64-v8a/libfoo.so", "elf");
        touch(raw.path(), "assets/data.bin", "x");
        touch(raw.path(), "META-INF/androidx.core_core.version", "1.9.0");

        let idx = PackageIndex::build(dec.path(), raw.path());
        assert_eq!(idx.area(TreeArea::Manifest).len(), 1);
        assert_eq!(idx.area(TreeArea::ResourceXml).len(), 1);
        assert_eq!(idx.area(TreeArea::Resource).len(), 1);
        assert_eq!(idx.area(TreeArea::Code).len(), 2);
        assert_eq!(idx.area(TreeArea::NativeLibrary).len(), 1);
        assert_eq!(idx.area(TreeArea::Asset).len(), 1);
        assert_eq!(idx.area(TreeArea::LibraryMetadata).len(), 1);
        assert!(idx.has_area(TreeArea::Code));
        assert_eq!(idx.metadata_dir().unwrap(), raw.path().join("META-INF"));
    }

    #[test]
    fn test_single_tree_and_missing_areas() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "AndroidManifest.xml", "<manifest/>");
        touch(dir.path(), "original/META-INF/MANIFEST.MF", "Created-By: x");
        touch(dir.path(), "lib/x86/libbar.so", "elf");

        let idx = PackageIndex::build(dir.path(), dir.path());
        assert_eq!(idx.area(TreeArea::NativeLibrary).len(), 1);
        assert_eq!(idx.area(TreeArea::LibraryMetadata).len(), 1);
        assert!(!idx.has_area(TreeArea::Asset));
        assert!(!idx.has_area(TreeArea::Code));
        assert!(idx.area(TreeArea::Asset).is_empty());
    }

    #[test]
    fn test_code_roots_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("smali_classes2")).unwrap();
        fs::create_dir_all(dir.path().join("smali")).unwrap();
        fs::create_dir_all(dir.path().join("res")).unwrap();
        let roots = code_roots(dir.path());
        assert_eq!(roots.len(), 2);
        assert!(roots[0].ends_with("smali"));
    }
}
