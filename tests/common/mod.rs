//! Shared fixtures: synthetic packages, decompiled trees, a fake decompiler

#![allow(dead_code)]

use sdkprobe::{Decompiler, ProbeError, ProbeResult};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zip::write::FileOptions;
use zip::ZipWriter;

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, bytes) in entries {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("inner.apk");
    write_zip(&path, entries);
    fs::read(path).unwrap()
}

pub fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;
    let mut zip = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut out = Vec::new();
    for i in 0..zip.len() {
        let mut e = zip.by_index(i).unwrap();
        let mut bytes = Vec::new();
        e.read_to_end(&mut bytes).unwrap();
        out.push((e.name().to_string(), bytes));
    }
    out
}

pub fn touch(root: &Path, rel: &str, content: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, content).unwrap();
}

pub const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.viewer" platformBuildVersionCode="34">
    <uses-permission android:name="android.permission.INTERNET"/>
    <uses-feature android:name="android.hardware.camera" android:required="false"/>
    <application android:label="@string/app_name">
        <activity android:name="com.pspdfkit.ui.PdfActivity"/>
        <provider android:authorities="com.example.viewer.pspdfkit"/>
    </application>
</manifest>
"#;

/// A decompiled tree that carries PSPDFKit evidence in several channels
pub fn decompiled_fixture(root: &Path) {
    touch(root, "AndroidManifest.xml", MANIFEST);
    touch(root, "apktool.yml", "version: 2.9.3\nsdkInfo:\n  minSdkVersion: 24\n  targetSdkVersion: 34\nversionInfo:\n  versionCode: 42\n  versionName: 3.1.0\n");
    touch(root, "res/values/strings.xml", "<resources><string name=\"app_name\">Example Viewer</string></resources>");
    touch(root, "res/layout/viewer.xml", "<com.pspdfkit.ui.PdfView/><com.pspdfkit.ui.Thumbs/>");
    touch(root, "res/values-de/strings.xml", "<resources/>");
    touch(root, "smali/com/pspdfkit/ui/PdfActivity.smali", ".class public Lcom/pspdfkit/ui/PdfActivity;");
    touch(root, "smali/com/example/viewer/Main.smali", "invoke-static {}, Lcom/pspdfkit/PSPDFKit;->init()V");
}

/// A raw tree with native libraries, assets and version stamps
pub fn raw_fixture(root: &Path) {
    touch(root, "lib/arm64-v8a/libpspdfkit.so", "ELF....");
    touch(root, "lib/arm64-v8a/libacme_corp_sdk.so", "ELF");
    touch(root, "lib/x86_64/libpspdfkit.so", "ELF....");
    touch(root, "assets/pspdfkit/fonts.bin", "fonts");
    touch(root, "META-INF/androidx.core_core.version", "1.12.0\n");
    touch(root, "META-INF/pspdfkit_android.version", "2024.1.0\n");
}

/// Stands in for apktool: writes a prepared tree into the output directory
pub struct FakeDecompiler {
    files: Vec<(String, String)>,
    last_out_dir: Arc<Mutex<Option<PathBuf>>>,
    fail: bool,
}

impl FakeDecompiler {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            files: files.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect(),
            last_out_dir: Arc::new(Mutex::new(None)),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self { files: vec![], last_out_dir: Arc::new(Mutex::new(None)), fail: true }
    }

    /// Shared slot recording where the engine asked for output; survives
    /// the decompiler being boxed into the engine
    pub fn out_dir_slot(&self) -> Arc<Mutex<Option<PathBuf>>> {
        Arc::clone(&self.last_out_dir)
    }
}

impl Decompiler for FakeDecompiler {
    fn name(&self) -> &str {
        "fake"
    }

    fn decompile(&self, _package: &Path, out_dir: &Path) -> ProbeResult<()> {
        *self.last_out_dir.lock().unwrap() = Some(out_dir.to_path_buf());
        if self.fail {
            fs::create_dir_all(out_dir)?;
            return Err(ProbeError::DecompilationFailed("fake failure".into()));
        }
        for (rel, content) in &self.files {
            touch(out_dir, rel, content);
        }
        Ok(())
    }
}

/// Report body with the timestamp line removed
pub fn without_timestamp(text: &str) -> String {
    text.lines()
        .filter(|l| !l.trim_start().starts_with("Generated:"))
        .collect::<Vec<_>>()
        .join("\n")
}
