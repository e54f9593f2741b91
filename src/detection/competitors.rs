//! Competitor triage: loose name matching of native libraries
//!
//! Whitespace inside a competitor name becomes a wildcard gap, so
//! "Acme Corp" matches `libacme_corp_sdk.so` and `acmexcorp`. Matches are
//! potential only; false positives are expected.

use super::{CompetitorMatch, NativeLibraryRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

/// Competitor display names, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompetitorList {
    pub names: Vec<String>,
}

impl CompetitorList {
    /// Load from a file; absent or unreadable files give an empty list
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let list = Self::parse(&text);
                tracing::info!("Competitor list: {} names from {}", list.names.len(), path.display());
                list
            }
            Err(e) => {
                tracing::debug!("No competitor list at {} ({})", path.display(), e);
                Self::default()
            }
        }
    }

    /// Skip blanks and `#` comments, strip `[...]` annotations
    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| ANNOTATION.replace_all(l, "").trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }
}

/// Compiled matcher over a competitor list
#[derive(Debug, Clone)]
pub struct CompetitorMatcher {
    patterns: Vec<(String, Regex)>,
}

impl CompetitorMatcher {
    pub fn new(list: &CompetitorList) -> Self {
        let patterns = list
            .names
            .iter()
            .filter_map(|name| {
                let tokens: Vec<String> = name.split_whitespace().map(regex::escape).collect();
                if tokens.is_empty() {
                    return None;
                }
                let pattern = format!("(?i){}", tokens.join(".*"));
                match Regex::new(&pattern) {
                    Ok(re) => Some((name.clone(), re)),
                    Err(e) => {
                        tracing::warn!("Skipping competitor '{}': {}", name, e);
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    /// First competitor whose pattern matches the library's name or path
    pub fn match_library(&self, lib: &NativeLibraryRecord) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(&lib.name) || re.is_match(&lib.path))
            .map(|(name, _)| name.as_str())
    }

    pub fn find_matches(&self, libraries: &[NativeLibraryRecord]) -> Vec<CompetitorMatch> {
        let matches: Vec<CompetitorMatch> = libraries
            .iter()
            .filter_map(|lib| {
                self.match_library(lib).map(|competitor| CompetitorMatch {
                    library_name: lib.name.clone(),
                    library_path: lib.path.clone(),
                    library_size: lib.size,
                    competitor: competitor.to_string(),
                })
            })
            .collect();
        if !matches.is_empty() {
            tracing::info!("Competitor triage: {} potential match(es)", matches.len());
        }
        matches
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
