//! Evidence channels: one probe per independent search strategy

pub mod code;
pub mod file_name;
pub mod manifest;
pub mod resources;

use super::file_index::TreeArea;
use super::pipeline::EvidenceProbe;
use crate::evidence::EvidenceChannel;

/// Build all six probes in the fixed channel order
pub fn build_probes() -> Vec<Box<dyn EvidenceProbe>> {
    vec![
        Box::new(manifest::ManifestProbe::new()),
        Box::new(resources::ResourceXmlProbe::new()),
        Box::new(code::CodeProbe::new()),
        Box::new(file_name::FileNameProbe::new(
            EvidenceChannel::NativeLibraryName,
            TreeArea::NativeLibrary,
        )),
        Box::new(file_name::FileNameProbe::new(EvidenceChannel::Assets, TreeArea::Asset)),
        Box::new(file_name::FileNameProbe::new(
            EvidenceChannel::LibraryMetadata,
            TreeArea::LibraryMetadata,
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_order_matches_channel_order() {
        let channels: Vec<_> = build_probes().iter().map(|p| p.channel()).collect();
        assert_eq!(channels, EvidenceChannel::ALL.to_vec());
    }
}
