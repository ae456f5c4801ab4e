//! Container identification via `mkvmerge --identify`.
//!
//! Identification is asked for in JSON so parsing stays stable across
//! mkvmerge releases. The raw document is reduced to a `StreamInventory`,
//! which the mapping and reconciliation stages consume.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::command::{build_identify_args, RunnerError, ToolRunner};
use crate::models::{AttachmentRecord, StreamInventory, StreamProps, StreamRecord, TrackType};

pub const MKVMERGE: &str = "mkvmerge";

#[derive(Error, Debug)]
pub enum ProbeError {
    /// The identify process itself failed.
    #[error(transparent)]
    Identify(#[from] RunnerError),

    /// The identify output was not valid JSON.
    #[error("Could not parse mkvmerge output for `{file}`: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// mkvmerge reported errors for the container.
    #[error("mkvmerge could not identify `{file}`: {message}")]
    Tool { file: String, message: String },

    /// The concatenated per-kind ids do not form 0..total.
    #[error(
        "`{file}` has an irregular stream order: expected id {expected} at {kind} position, \
         found {found}; repair the file with the remux workflow first"
    )]
    OrderMismatch {
        file: String,
        kind: TrackType,
        expected: u32,
        found: u32,
    },

    /// A required kind is absent entirely.
    #[error("`{file}` has no {kind} stream")]
    MissingKind { file: String, kind: TrackType },
}

pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Debug, Deserialize)]
struct IdentifyDoc {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    tracks: Vec<RawTrack>,
    #[serde(default)]
    attachments: Vec<RawAttachment>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: u32,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    properties: RawProps,
}

#[derive(Debug, Default, Deserialize)]
struct RawProps {
    #[serde(default)]
    codec_id: String,
    language: Option<String>,
    track_name: Option<String>,
    default_track: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawAttachment {
    id: u32,
    file_name: String,
}

/// Identify one file and build its stream inventory.
pub fn identify(runner: &dyn ToolRunner, file: &Path) -> ProbeResult<StreamInventory> {
    let output = runner.run(MKVMERGE, &build_identify_args(file))?;
    parse_identify_json(&output.stdout, file)
}

/// Parse a JSON identify document into a `StreamInventory`.
///
/// Track kinds other than video/audio/subtitles (buttons, for instance)
/// are not part of any workflow here and are skipped.
pub fn parse_identify_json(json: &str, file: &Path) -> ProbeResult<StreamInventory> {
    let doc: IdentifyDoc = serde_json::from_str(json).map_err(|e| ProbeError::Parse {
        file: file.display().to_string(),
        source: e,
    })?;

    if !doc.errors.is_empty() {
        return Err(ProbeError::Tool {
            file: file.display().to_string(),
            message: doc.errors.join("; "),
        });
    }

    let mut inventory = StreamInventory::new(file);
    for track in doc.tracks {
        let Some(kind) = TrackType::from_mkvmerge_type(&track.kind) else {
            debug!("Skipping track {} of type `{}`", track.id, track.kind);
            continue;
        };
        let props = StreamProps {
            codec_id: track.properties.codec_id,
            language: track.properties.language,
            track_name: track.properties.track_name,
            default_track: track.properties.default_track,
        };
        inventory.push(kind, StreamRecord::new(track.id, props));
    }
    for attachment in doc.attachments {
        inventory.attachments.push(AttachmentRecord {
            id: attachment.id,
            file_name: attachment.file_name,
        });
    }
    Ok(inventory)
}

/// Check that ids concatenated in canonical kind order cover `0..total`
/// without gaps or swaps. Files failing this cannot be converted as-is.
pub fn validate_order(inventory: &StreamInventory) -> ProbeResult<()> {
    let mut expected: u32 = 0;
    for kind in TrackType::ORDERED {
        for record in inventory.records(kind) {
            if record.id != expected {
                return Err(ProbeError::OrderMismatch {
                    file: inventory.file_name(),
                    kind,
                    expected,
                    found: record.id,
                });
            }
            expected += 1;
        }
    }
    Ok(())
}

/// Check that every kind the conversion needs is present at least once.
pub fn validate_required_kinds(inventory: &StreamInventory) -> ProbeResult<()> {
    for kind in TrackType::ORDERED {
        if inventory.count(kind) == 0 {
            return Err(ProbeError::MissingKind {
                file: inventory.file_name(),
                kind,
            });
        }
    }
    Ok(())
}
