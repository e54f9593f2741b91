//! Manifest channel: matching lines in the decoded AndroidManifest.xml

use crate::engine::file_index::TreeArea;
use crate::engine::pipeline::{read_text, EvidenceProbe, Keyword, ScanContext};
use crate::evidence::{ChannelHits, EvidenceChannel};

pub struct ManifestProbe;

impl ManifestProbe {
    pub fn new() -> Self { Self }
}

impl EvidenceProbe for ManifestProbe {
    fn channel(&self) -> EvidenceChannel {
        EvidenceChannel::Manifest
    }

    fn area(&self) -> TreeArea {
        TreeArea::Manifest
    }

    fn probe(&self, keyword: &Keyword, ctx: &ScanContext) -> ChannelHits {
        let mut hits = ChannelHits::default();
        for file in ctx.index.area(TreeArea::Manifest) {
            let text = read_text(&file.path);
            let lines = text.lines().filter(|l| keyword.matches(l)).count();
            hits.add_file(&file.rel, lines);
        }
        hits
    }
}
