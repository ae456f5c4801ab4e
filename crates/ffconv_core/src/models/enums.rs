//! Core enums used throughout the crate.

use serde::{Deserialize, Serialize};

/// Type of media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Video,
    Audio,
    Subtitles,
}

impl TrackType {
    /// The canonical kind ordering a well-formed file must follow.
    pub const ORDERED: [TrackType; 3] = [TrackType::Video, TrackType::Audio, TrackType::Subtitles];

    /// Parse the `type` discriminator from mkvmerge identify output.
    pub fn from_mkvmerge_type(s: &str) -> Option<Self> {
        match s {
            "video" => Some(TrackType::Video),
            "audio" => Some(TrackType::Audio),
            "subtitles" => Some(TrackType::Subtitles),
            _ => None,
        }
    }

    /// The singular name used by mkvmerge track-selection flags
    /// (`--video-tracks`, `--audio-tracks`, `--subtitle-tracks`).
    pub fn flag_name(&self) -> &'static str {
        match self {
            TrackType::Video => "video",
            TrackType::Audio => "audio",
            TrackType::Subtitles => "subtitle",
        }
    }
}

impl std::fmt::Display for TrackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackType::Video => write!(f, "video"),
            TrackType::Audio => write!(f, "audio"),
            TrackType::Subtitles => write!(f, "subtitles"),
        }
    }
}

/// Classification of a resolved CLI path token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    File,
    Directory,
}
