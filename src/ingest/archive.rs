//! Zip archive helpers: extraction with collision tracking, recompression

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entries that Android expects to find uncompressed in a package
const STORED_NAMES: &[&str] = &["resources.arsc"];
const STORED_EXTENSIONS: &[&str] = &["so", "png", "jpg", "ogg", "mp3", "mp4"];

/// Outcome of extracting one archive into a directory
#[derive(Debug, Clone, Default)]
pub struct ExtractStats {
    pub entries_written: usize,
    pub bytes_written: u64,
    /// Relative paths that already existed with different content and were overwritten
    pub overwritten: Vec<PathBuf>,
    /// Entries rejected because their name escapes the destination
    pub rejected: Vec<String>,
}

/// Extract every file entry of `archive` into `dest`, overwriting on collision.
///
/// Existing files are compared by SHA-256 before being replaced so callers can
/// tell identical re-writes apart from real content conflicts.
pub fn extract_into(archive: &Path, dest: &Path) -> Result<ExtractStats, String> {
    let file = File::open(archive)
        .map_err(|e| format!("Failed to open {}: {}", archive.display(), e))?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| format!("Invalid zip archive {}: {}", archive.display(), e))?;

    fs::create_dir_all(dest)
        .map_err(|e| format!("Failed to create {}: {}", dest.display(), e))?;

    let mut stats = ExtractStats::default();

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| format!("Zip entry {} unreadable: {}", i, e))?;

        let rel = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                tracing::warn!("Skipping unsafe entry name '{}' in {}", entry.name(), archive.display());
                stats.rejected.push(entry.name().to_string());
                continue;
            }
        };
        let target = dest.join(&rel);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| format!("Failed to create {}: {}", target.display(), e))?;
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| format!("Failed to read entry {}: {}", rel.display(), e))?;

        if target.is_file() {
            let existing = sha256_file(&target)
                .map_err(|e| format!("Failed to hash {}: {}", target.display(), e))?;
            if existing != hex::encode(Sha256::digest(&bytes)) {
                stats.overwritten.push(rel.clone());
            }
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        fs::write(&target, &bytes)
            .map_err(|e| format!("Failed to write {}: {}", target.display(), e))?;

        stats.entries_written += 1;
        stats.bytes_written += bytes.len() as u64;
    }

    Ok(stats)
}

/// Recompress a directory tree into a zip file at `output`.
///
/// Entries are written in sorted path order so the same tree always yields
/// the same archive layout. Returns the number of file entries written.
pub fn compress_dir(src: &Path, output: &Path) -> Result<usize, String> {
    let file = File::create(output)
        .map_err(|e| format!("Failed to create {}: {}", output.display(), e))?;
    let mut zip = ZipWriter::new(file);
    let mut written = 0usize;

    for entry in WalkDir::new(src)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let rel = match entry.path().strip_prefix(src) {
            Ok(r) => r,
            Err(_) => continue,
        };
        let name = zip_entry_name(rel);

        let options = FileOptions::default().compression_method(compression_for(rel));
        zip.start_file(name.clone(), options)
            .map_err(|e| format!("Failed to start entry {}: {}", name, e))?;

        let bytes = fs::read(entry.path())
            .map_err(|e| format!("Failed to read {}: {}", entry.path().display(), e))?;
        zip.write_all(&bytes)
            .map_err(|e| format!("Failed to write entry {}: {}", name, e))?;
        written += 1;
    }

    zip.finish()
        .map_err(|e| format!("Failed to finalize {}: {}", output.display(), e))?;
    Ok(written)
}

/// Whether a zip file contains at least one `.apk` entry
pub fn contains_packages(archive: &Path) -> Result<bool, String> {
    let file = File::open(archive)
        .map_err(|e| format!("Failed to open {}: {}", archive.display(), e))?;
    let zip = ZipArchive::new(file)
        .map_err(|e| format!("Invalid zip archive {}: {}", archive.display(), e))?;
    let found = zip.file_names().any(|n| n.to_lowercase().ends_with(".apk"));
    Ok(found)
}

/// SHA-256 of a file, hex encoded
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn zip_entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn compression_for(rel: &Path) -> CompressionMethod {
    let name = rel.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = rel
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if STORED_NAMES.contains(&name) || STORED_EXTENSIONS.contains(&ext.as_str()) {
        CompressionMethod::Stored
    } else {
        CompressionMethod::Deflated
    }
}
