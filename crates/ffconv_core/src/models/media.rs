//! Media-related data structures (stream records, inventories, mappings).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::TrackType;

/// Properties of a single stream as reported by mkvmerge identify.
///
/// Equality over all fields is used by the reconciler to detect surplus
/// tracks across a batch, so every captured property participates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamProps {
    /// Codec identifier (e.g. "A_AAC", "V_MPEG4/ISO/AVC").
    pub codec_id: String,
    /// Language code (ISO 639-2), if tagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Track name/title, if tagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
    /// Default-track flag, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_track: Option<bool>,
}

impl StreamProps {
    /// Create properties with the required codec id.
    pub fn new(codec_id: impl Into<String>) -> Self {
        Self {
            codec_id: codec_id.into(),
            ..Default::default()
        }
    }

    /// Set the language code.
    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.language = Some(lang.into());
        self
    }

    /// Set the track name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.track_name = Some(name.into());
        self
    }

    /// Set the default-track flag.
    pub fn with_default(mut self, default: bool) -> Self {
        self.default_track = Some(default);
        self
    }
}

/// A single stream within a container, identified by its global id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// Global track id (mkvmerge numbering across all kinds).
    pub id: u32,
    /// Stream properties.
    pub props: StreamProps,
}

impl StreamRecord {
    pub fn new(id: u32, props: StreamProps) -> Self {
        Self { id, props }
    }
}

/// An attachment entry (fonts, images) listed by mkvmerge identify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: u32,
    pub file_name: String,
}

/// Per-file stream layout grouped by kind, in first-seen kind order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamInventory {
    /// Path of the probed file.
    pub file: PathBuf,
    /// Streams grouped by kind. The outer ordering preserves the order in
    /// which kinds first appeared in the identify output.
    pub groups: Vec<(TrackType, Vec<StreamRecord>)>,
    /// Attachments carried by the container.
    pub attachments: Vec<AttachmentRecord>,
}

impl StreamInventory {
    /// Create an empty inventory for a file.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            groups: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Append a stream record under its kind, preserving first-seen order.
    pub fn push(&mut self, kind: TrackType, record: StreamRecord) {
        if let Some((_, streams)) = self.groups.iter_mut().find(|(k, _)| *k == kind) {
            streams.push(record);
        } else {
            self.groups.push((kind, vec![record]));
        }
    }

    /// Streams of the given kind, empty when the kind is absent.
    pub fn records(&self, kind: TrackType) -> &[StreamRecord] {
        self.groups
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, streams)| streams.as_slice())
            .unwrap_or(&[])
    }

    /// Number of streams of the given kind.
    pub fn count(&self, kind: TrackType) -> usize {
        self.records(kind).len()
    }

    /// Total stream count across all kinds.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, streams)| streams.len()).sum()
    }

    /// Per-kind counts in canonical kind order, for batch comparison.
    pub fn count_vector(&self) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for (i, kind) in TrackType::ORDERED.iter().enumerate() {
            counts[i] = self.count(*kind);
        }
        counts
    }

    /// File name for reporting.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.file.display().to_string())
    }
}

/// A stream picked for one kind, with the id to feed to the external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedStream {
    /// Stream id. Global for video/audio; kind-relative for subtitles,
    /// because the subtitles filter addresses its own kind zero-based.
    pub id: u32,
    /// Properties of the selected stream.
    pub props: StreamProps,
}

/// Resolved kind-to-stream assignment for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMapping {
    pub video: SelectedStream,
    pub audio: SelectedStream,
    pub subtitles: SelectedStream,
}

/// Whether a probed file produced a fresh mapping or reuses the batch one.
///
/// Only the first file of a batch is mapped; subsequent files are validated
/// and then reuse the cached mapping. The explicit variant forces every
/// call site to handle both cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
    /// Mapping computed from this file (first of its batch).
    Fresh(StreamMapping),
    /// File validated; the batch mapping applies.
    Reused,
}

/// Strip characters from a file name that would break the single-quoted
/// ffmpeg subtitles filter expression.
pub fn sanitized_file_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let cleaned: String = name.chars().filter(|c| *c != '"' && *c != '\'').collect();
    if cleaned == name {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_preserves_first_seen_kind_order() {
        let mut inv = StreamInventory::new("/test.mkv");
        inv.push(TrackType::Video, StreamRecord::new(0, StreamProps::new("V_MPEG4/ISO/AVC")));
        inv.push(TrackType::Audio, StreamRecord::new(1, StreamProps::new("A_AAC")));
        inv.push(TrackType::Audio, StreamRecord::new(2, StreamProps::new("A_FLAC")));
        inv.push(TrackType::Subtitles, StreamRecord::new(3, StreamProps::new("S_TEXT/ASS")));

        assert_eq!(inv.groups[0].0, TrackType::Video);
        assert_eq!(inv.groups[1].0, TrackType::Audio);
        assert_eq!(inv.count(TrackType::Audio), 2);
        assert_eq!(inv.total(), 4);
        assert_eq!(inv.count_vector(), [1, 2, 1]);
    }

    #[test]
    fn missing_kind_is_empty() {
        let inv = StreamInventory::new("/test.mkv");
        assert!(inv.records(TrackType::Video).is_empty());
        assert_eq!(inv.count(TrackType::Subtitles), 0);
    }

    #[test]
    fn sanitized_name_strips_quotes_once() {
        let dirty = Path::new("/tmp/it's \"here\".mkv");
        let cleaned = sanitized_file_name(dirty).unwrap();
        assert_eq!(cleaned, "its here.mkv");

        // Already-clean names need no rename.
        assert!(sanitized_file_name(Path::new("/tmp/its here.mkv")).is_none());
    }

    #[test]
    fn props_equality_covers_all_fields() {
        let a = StreamProps::new("A_AAC").with_language("jpn").with_default(true);
        let b = StreamProps::new("A_AAC").with_language("jpn").with_default(false);
        assert_ne!(a, b);
    }
}
