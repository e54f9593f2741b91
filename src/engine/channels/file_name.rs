//! File-name channels: native libraries, assets and library metadata
//!
//! One hit per file whose name contains the keyword.

use crate::engine::file_index::TreeArea;
use crate::engine::pipeline::{EvidenceProbe, Keyword, ScanContext};
use crate::evidence::{ChannelHits, EvidenceChannel};

pub struct FileNameProbe {
    channel: EvidenceChannel,
    area: TreeArea,
}

impl FileNameProbe {
    pub fn new(channel: EvidenceChannel, area: TreeArea) -> Self {
        Self { channel, area }
    }
}

impl EvidenceProbe for FileNameProbe {
    fn channel(&self) -> EvidenceChannel {
        self.channel
    }

    fn area(&self) -> TreeArea {
        self.area
    }

    fn probe(&self, keyword: &Keyword, ctx: &ScanContext) -> ChannelHits {
        let mut hits = ChannelHits::default();
        for file in ctx.index.area(self.area) {
            if file.name_lower().contains(&keyword.needle) {
                hits.add_file(&file.rel, 1);
            }
        }
        hits
    }
}
