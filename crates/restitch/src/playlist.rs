//! Playlist text classification and parsing.
//!
//! The classifier works on the raw text the way the wire format is
//! actually probed: the `#EXTM3U` header must open the content, a
//! `#EXT-X-STREAM-INF` tag makes the document a master playlist, and an
//! `#EXTINF` tag makes it a media playlist. Structured parsing is then
//! delegated to `m3u8-rs`, and the result is mapped into this crate's
//! own immutable model so parser internals never escape this module.

use crate::error::RestitchError;

const HEADER_TAG: &str = "#EXTM3U";
const STREAM_VARIANT_TAG: &str = "#EXT-X-STREAM-INF";
const SEGMENT_DURATION_TAG: &str = "#EXTINF";

/// A parsed playlist, exactly one of the two kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Playlist {
    Master(MasterManifest),
    Media(MediaManifest),
}

/// Quality variants of a master playlist, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterManifest {
    pub renditions: Vec<Rendition>,
}

/// One variant entry of a master playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendition {
    /// Resolution label, e.g. `1280x720`; the selection key.
    pub label: String,
    /// Reference to the variant's media playlist.
    pub uri: String,
}

/// Segments of a media playlist, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaManifest {
    pub segments: Vec<Segment>,
}

/// One media segment reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub uri: String,
    /// Advisory duration; reassembly never depends on it.
    pub duration_secs: f32,
}

impl MasterManifest {
    /// Looks up a rendition by resolution label. Duplicate labels keep
    /// the last occurrence, matching how repeated definitions overwrite
    /// earlier ones in a keyed mapping.
    pub fn select(&self, label: &str) -> Option<&Rendition> {
        self.renditions.iter().rev().find(|r| r.label == label)
    }

    /// Distinct labels in first-occurrence order, for error reporting.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::with_capacity(self.renditions.len());
        for rendition in &self.renditions {
            if !labels.contains(&rendition.label) {
                labels.push(rendition.label.clone());
            }
        }
        labels
    }
}

/// Parses playlist text into a [`Playlist`]. Pure text-to-structure
/// transformation; no I/O happens here.
pub fn parse(text: &str) -> Result<Playlist, RestitchError> {
    if !text.starts_with(HEADER_TAG) {
        return Err(RestitchError::format("content does not start with #EXTM3U"));
    }

    if text.contains(STREAM_VARIANT_TAG) {
        let master = m3u8_rs::parse_master_playlist_res(text.as_bytes())
            .map_err(|e| RestitchError::format(format!("master playlist: {e}")))?;

        let renditions = master
            .variants
            .iter()
            .filter(|variant| !variant.is_i_frame)
            .filter_map(|variant| {
                variant.resolution.as_ref().map(|resolution| Rendition {
                    label: format!("{}x{}", resolution.width, resolution.height),
                    uri: variant.uri.clone(),
                })
            })
            .collect();

        return Ok(Playlist::Master(MasterManifest { renditions }));
    }

    if text.contains(SEGMENT_DURATION_TAG) {
        let media = m3u8_rs::parse_media_playlist_res(text.as_bytes())
            .map_err(|e| RestitchError::format(format!("media playlist: {e}")))?;

        let segments = media
            .segments
            .iter()
            .map(|segment| Segment {
                uri: segment.uri.clone(),
                duration_secs: segment.duration,
            })
            .collect();

        return Ok(Playlist::Media(MediaManifest { segments }));
    }

    Err(RestitchError::UnknownPlaylistType)
}
