//! Source readers.
//!
//! Both readers share one contract: given raw text, produce an ordered
//! sequence of channel records with every recoverable field populated and
//! absent fields left empty. A reader never fails on a merely incomplete
//! record; structurally unreadable lines are skipped, not fatal to the file.

pub mod m3u;
pub mod two_column;

use crate::models::{Channel, PlaylistHeader};

/// Which input grammar to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `#EXTINF` attribute line followed by a URL line.
    M3u,
    /// One `name,url` pair per line.
    TwoColumn,
}

impl SourceFormat {
    /// Selects the grammar for a file by its extension, if recognized.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "m3u" | "m3u8" => Some(Self::M3u),
            "txt" => Some(Self::TwoColumn),
            _ => None,
        }
    }
}

/// The decoded contents of one input file.
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub header: PlaylistHeader,
    pub channels: Vec<Channel>,
}

/// Decodes raw text with the selected grammar.
pub fn read_source(content: &str, format: SourceFormat) -> ParsedSource {
    match format {
        SourceFormat::M3u => m3u::M3uReader::new().parse(content),
        SourceFormat::TwoColumn => ParsedSource {
            header: PlaylistHeader::default(),
            channels: two_column::parse(content),
        },
    }
}
