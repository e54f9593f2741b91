//! Configuration file: `.sdkprobe.toml`
//!
//! Every field of [`ProbeConfig`] may be set here; anything omitted keeps
//! its default. Command-line flags are applied on top by the binary.
//!
//! ```toml
//! code_scan_file_cap = 100
//! code_scan_tokens = ["vendor", "library", "sdk", "thirdparty"]
//! library_db = "/opt/sdkprobe/libraries.txt"
//! competitor_list = "/opt/sdkprobe/competitors.txt"
//! report_format = "json"
//! ```

use crate::engine::ProbeConfig;
use crate::{ProbeError, ProbeResult};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".sdkprobe.toml";

/// Load configuration from an explicit file. A missing or malformed file is
/// an input error here, since the caller asked for it by name.
pub fn from_file(path: &Path) -> ProbeResult<ProbeConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ProbeError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config = parse(&content)
        .map_err(|e| ProbeError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

pub fn parse(content: &str) -> Result<ProbeConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Look for `.sdkprobe.toml` in `dir`. Absent means defaults; present but
/// malformed is still an error.
pub fn from_dir(dir: &Path) -> ProbeResult<ProbeConfig> {
    match discover(dir) {
        Some(path) => from_file(&path),
        None => {
            tracing::debug!("No {} in {}; using defaults", CONFIG_FILE_NAME, dir.display());
            Ok(ProbeConfig::default())
        }
    }
}

pub fn discover(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    path.is_file().then_some(path)
}

/// Explicit `--config` wins; otherwise the working directory is searched
pub fn resolve(explicit: Option<&Path>) -> ProbeResult<ProbeConfig> {
    match explicit {
        Some(path) => from_file(path),
        None => {
            let cwd = std::env::current_dir()?;
            from_dir(&cwd)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportFormat;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg = parse("code_scan_file_cap = 7\nreport_format = \"json\"\n").unwrap();
        assert_eq!(cfg.code_scan_file_cap, 7);
        assert_eq!(cfg.report_format, ReportFormat::Json);
        assert_eq!(cfg.code_scan_tokens, ProbeConfig::default().code_scan_tokens);
        assert!(!cfg.keep_workdirs);
        assert!(cfg.decompiler_args.is_empty());
    }

    #[test]
    fn test_decompiler_args_from_file() {
        let cfg = parse("decompiler = \"/opt/apktool/apktool\"\ndecompiler_args = [\"--no-src\"]\n").unwrap();
        assert_eq!(cfg.decompiler, std::path::PathBuf::from("/opt/apktool/apktool"));
        assert_eq!(cfg.decompiler_args, vec!["--no-src".to_string()]);
    }

    #[test]
    fn test_absent_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = from_dir(dir.path()).unwrap();
        assert_eq!(cfg.code_scan_file_cap, 50);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "code_scan_file_cap = \"many\"").unwrap();
        let err = from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }
}
