//! Reference database of known native libraries
//!
//! Line-oriented, pipe-delimited: `name|description|vendor[|version]`.
//! Lookup is a case-insensitive prefix match of the library file name
//! against `name`; the first matching row wins. A missing file is not an
//! error, it just makes every lookup come back empty.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of the reference database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDbEntry {
    pub name: String,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub version: Option<String>,
    #[serde(skip)]
    name_lower: String,
}

#[derive(Debug, Clone, Default)]
pub struct LibraryDb {
    entries: Vec<LibraryDbEntry>,
}

impl LibraryDb {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from a file; absent or unreadable files give an empty database
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let db = Self::parse(&text);
                tracing::info!("Library database: {} entries from {}", db.len(), path.display());
                db
            }
            Err(e) => {
                tracing::debug!("No library database at {} ({})", path.display(), e);
                Self::empty()
            }
        }
    }

    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|line| {
                let mut fields = line.split('|').map(str::trim);
                let name = fields.next().filter(|n| !n.is_empty())?.to_string();
                let mut next = || fields.next().filter(|f| !f.is_empty()).map(str::to_string);
                let description = next();
                let vendor = next();
                let version = next();
                Some(LibraryDbEntry {
                    name_lower: name.to_lowercase(),
                    name,
                    description,
                    vendor,
                    version,
                })
            })
            .collect();
        Self { entries }
    }

    /// First row whose name is a case-insensitive prefix of `library_name`
    pub fn lookup(&self, library_name: &str) -> Option<&LibraryDbEntry> {
        let lower = library_name.to_lowercase();
        self.entries.iter().find(|e| lower.starts_with(&e.name_lower))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
