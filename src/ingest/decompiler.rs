//! External decompiler collaborator
//!
//! The decompiler turns a package into a readable tree (text manifest,
//! decoded resources, smali/java sources). Success means exit code 0 *and*
//! a manifest in the output directory.

use crate::{ProbeError, ProbeResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const MANIFEST_FILE: &str = "AndroidManifest.xml";

/// A tool that decompiles a package into `out_dir`
pub trait Decompiler: Send + Sync {
    /// Human-readable tool name for logging and the report footer
    fn name(&self) -> &str;

    /// Decompile `package` into `out_dir`
    fn decompile(&self, package: &Path, out_dir: &Path) -> ProbeResult<()>;

    /// Fail early with an environment error when the tool cannot run
    fn check(&self) -> ProbeResult<()> {
        Ok(())
    }
}

/// apktool (`apktool d -f -o <out> <package>`)
#[derive(Debug, Clone)]
pub struct ApktoolDecompiler {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl ApktoolDecompiler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Extra arguments inserted after `d -f`, e.g. `--no-src` or `--frame-path`
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Check the tool can be launched at all
    pub fn ensure_available(&self) -> ProbeResult<()> {
        match Command::new(&self.program).arg("--version").output() {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(self.unavailable()),
            Err(e) => Err(ProbeError::ToolUnavailable {
                tool: self.program.display().to_string(),
                hint: format!("failed to launch: {}", e),
            }),
        }
    }

    fn unavailable(&self) -> ProbeError {
        ProbeError::ToolUnavailable {
            tool: self.program.display().to_string(),
            hint: "install apktool (https://apktool.org) and a Java runtime, \
                   or point `decompiler` in .sdkprobe.toml at the apktool launcher"
                .to_string(),
        }
    }
}

impl Default for ApktoolDecompiler {
    fn default() -> Self {
        Self::new("apktool")
    }
}

impl Decompiler for ApktoolDecompiler {
    fn name(&self) -> &str {
        "apktool"
    }

    fn check(&self) -> ProbeResult<()> {
        self.ensure_available()
    }

    fn decompile(&self, package: &Path, out_dir: &Path) -> ProbeResult<()> {
        tracing::info!("Decompiling {} with {}", package.display(), self.program.display());

        let output = Command::new(&self.program)
            .arg("d")
            .arg("-f")
            .args(&self.extra_args)
            .arg("-o")
            .arg(out_dir)
            .arg(package)
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    self.unavailable()
                } else {
                    ProbeError::DecompilationFailed(format!("failed to launch: {}", e))
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::DecompilationFailed(format!(
                "{} exited with {}: {}",
                self.name(),
                output.status,
                stderr_tail(&output.stderr, 8)
            )));
        }
        verify_output(out_dir)
    }
}

/// The decompiler contract: a manifest must exist in the output directory
pub fn verify_output(out_dir: &Path) -> ProbeResult<()> {
    if out_dir.join(MANIFEST_FILE).is_file() {
        Ok(())
    } else {
        Err(ProbeError::DecompilationFailed(format!(
            "no {} in {}",
            MANIFEST_FILE,
            out_dir.display()
        )))
    }
}

fn stderr_tail(stderr: &[u8], lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join(" | ")
}
