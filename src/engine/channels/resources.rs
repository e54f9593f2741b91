//! Resource-XML channel: total matches across every XML file under res/

use crate::engine::file_index::TreeArea;
use crate::engine::pipeline::{read_text, EvidenceProbe, Keyword, ScanContext};
use crate::evidence::{ChannelHits, EvidenceChannel};

pub struct ResourceXmlProbe;

impl ResourceXmlProbe {
    pub fn new() -> Self { Self }
}

impl EvidenceProbe for ResourceXmlProbe {
    fn channel(&self) -> EvidenceChannel {
        EvidenceChannel::ResourceXml
    }

    fn area(&self) -> TreeArea {
        TreeArea::ResourceXml
    }

    fn probe(&self, keyword: &Keyword, ctx: &ScanContext) -> ChannelHits {
        let mut hits = ChannelHits::default();
        for file in ctx.index.area(TreeArea::ResourceXml) {
            let n = keyword.occurrences(&read_text(&file.path));
            hits.add_file(&file.rel, n);
        }
        hits
    }
}
