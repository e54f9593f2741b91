//! Evidence records: per-keyword hit counts across six detection channels
//!
//! A record is assembled through [`EvidenceRecordBuilder`]: each channel adds
//! its hits (counts only ever grow), then `finalize()` derives the `found`
//! flag and the human-readable location summary exactly once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of file names quoted per channel in a location summary
const SUMMARY_FILE_LIMIT: usize = 5;

/// One independent search strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EvidenceChannel {
    Manifest,
    ResourceXml,
    Code,
    NativeLibraryName,
    Assets,
    LibraryMetadata,
}

impl EvidenceChannel {
    /// Fixed probe order
    pub const ALL: [EvidenceChannel; 6] = [
        Self::Manifest,
        Self::ResourceXml,
        Self::Code,
        Self::NativeLibraryName,
        Self::Assets,
        Self::LibraryMetadata,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Manifest => "AndroidManifest.xml",
            Self::ResourceXml => "Resource XML",
            Self::Code => "Decompiled code",
            Self::NativeLibraryName => "Native libraries",
            Self::Assets => "Assets",
            Self::LibraryMetadata => "Library metadata (META-INF)",
        }
    }

    /// How the channel searches, for the "detection methods" report section
    pub fn method(self) -> &'static str {
        match self {
            Self::Manifest => "Case-insensitive search of AndroidManifest.xml (matching lines)",
            Self::ResourceXml => "Case-insensitive search of every XML file under res/ (total matches)",
            Self::Code => "Decompiled code: file-name match plus bounded content search of likely SDK paths",
            Self::NativeLibraryName => "Native library file names under lib/<abi>/",
            Self::Assets => "File names under assets/",
            Self::LibraryMetadata => "File names under META-INF/ (version stamps, module files)",
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Self::Manifest => "line",
            Self::ResourceXml => "match",
            _ => "file",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Manifest => 0,
            Self::ResourceXml => 1,
            Self::Code => 2,
            Self::NativeLibraryName => 3,
            Self::Assets => 4,
            Self::LibraryMetadata => 5,
        }
    }
}

impl std::fmt::Display for EvidenceChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What one channel contributed for one keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEvidence {
    pub channel: EvidenceChannel,
    /// False when the channel's directory does not exist in the package
    pub scanned: bool,
    pub count: usize,
    /// Distinct matching files, relative to their tree, sorted
    pub files: Vec<String>,
}

impl ChannelEvidence {
    fn empty(channel: EvidenceChannel) -> Self {
        Self {
            channel,
            scanned: false,
            count: 0,
            files: Vec::new(),
        }
    }
}

/// Hits reported by one probe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelHits {
    pub count: usize,
    pub files: Vec<String>,
}

impl ChannelHits {
    pub fn add_file(&mut self, rel: &str, count: usize) {
        if count == 0 {
            return;
        }
        self.count += count;
        if !self.files.iter().any(|f| f == rel) {
            self.files.push(rel.to_string());
        }
    }
}

/// Frozen result of searching for one keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub keyword: String,
    pub found: bool,
    /// Always six entries, in [`EvidenceChannel::ALL`] order
    pub channels: Vec<ChannelEvidence>,
    pub location_summary: String,
}

impl EvidenceRecord {
    pub fn builder(keyword: impl Into<String>) -> EvidenceRecordBuilder {
        EvidenceRecordBuilder {
            keyword: keyword.into(),
            channels: EvidenceChannel::ALL.map(ChannelEvidence::empty),
        }
    }

    pub fn channel(&self, channel: EvidenceChannel) -> &ChannelEvidence {
        &self.channels[channel.index()]
    }

    pub fn count(&self, channel: EvidenceChannel) -> usize {
        self.channel(channel).count
    }

    pub fn total_hits(&self) -> usize {
        self.channels.iter().map(|c| c.count).sum()
    }

    /// Channels with at least one hit
    pub fn hit_channels(&self) -> impl Iterator<Item = &ChannelEvidence> {
        self.channels.iter().filter(|c| c.count > 0)
    }
}

/// Builder for evidence records
#[derive(Debug, Clone)]
pub struct EvidenceRecordBuilder {
    keyword: String,
    channels: [ChannelEvidence; 6],
}

impl EvidenceRecordBuilder {
    /// Add a channel's hits. Counts are additive and never decrease.
    pub fn record(&mut self, channel: EvidenceChannel, hits: ChannelHits) -> &mut Self {
        let slot = &mut self.channels[channel.index()];
        slot.scanned = true;
        slot.count = slot.count.saturating_add(hits.count);
        for f in hits.files {
            if !slot.files.contains(&f) {
                slot.files.push(f);
            }
        }
        self
    }

    /// Mark a channel as skipped because its directory is absent
    pub fn skip(&mut self, channel: EvidenceChannel) -> &mut Self {
        tracing::debug!("'{}': {} not present, skipped", self.keyword, channel);
        self
    }

    pub fn finalize(self) -> EvidenceRecord {
        let mut channels = self.channels.to_vec();
        for c in &mut channels {
            c.files.sort();
        }
        let found = channels.iter().any(|c| c.count > 0);
        let location_summary = summarize(&channels);
        EvidenceRecord {
            keyword: self.keyword,
            found,
            channels,
            location_summary,
        }
    }
}

fn summarize(channels: &[ChannelEvidence]) -> String {
    let parts: Vec<String> = channels
        .iter()
        .filter(|c| c.count > 0)
        .map(|c| {
            let unit = if c.count == 1 {
                c.channel.unit().to_string()
            } else {
                format!("{}s", c.channel.unit())
            };
            let mut s = format!("{} ({} {}", c.channel.label(), c.count, unit);
            if !c.files.is_empty() && c.channel != EvidenceChannel::Manifest {
                let shown: Vec<&str> = c.files.iter().take(SUMMARY_FILE_LIMIT).map(String::as_str).collect();
                s.push_str(": ");
                s.push_str(&shown.join(", "));
                if c.files.len() > SUMMARY_FILE_LIMIT {
                    s.push_str(&format!(", +{} more", c.files.len() - SUMMARY_FILE_LIMIT));
                }
            }
            s.push(')');
            s
        })
        .collect();

    if parts.is_empty() {
        "No matches in any detection channel".to_string()
    } else {
        format!("Found in: {}", parts.join("; "))
    }
}

/// Evidence for every requested keyword, keyed by the keyword as requested
pub type EvidenceMap = BTreeMap<String, EvidenceRecord>;
