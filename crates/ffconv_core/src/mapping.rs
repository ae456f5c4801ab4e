//! Stream selection and kind-to-stream mapping.
//!
//! One stream of each kind is chosen per batch. Selection is behind a
//! trait so the CLI can put an interactive prompt there while tests and
//! non-interactive callers pick deterministically.

use thiserror::Error;
use tracing::debug;

use crate::models::{SelectedStream, StreamInventory, StreamMapping, StreamRecord, TrackType};

#[derive(Error, Debug)]
pub enum MappingError {
    /// No streams of the kind to choose from.
    #[error("`{file}` has no {kind} streams to select from")]
    NoStreams { file: String, kind: TrackType },

    /// A selector returned an id not present among the candidates.
    #[error("Selected {kind} id {id} is not one of the available streams")]
    InvalidSelection { kind: TrackType, id: u32 },

    /// Selection was aborted by the selector (e.g. user interrupt).
    #[error("{kind} stream selection aborted: {reason}")]
    Aborted { kind: TrackType, reason: String },

    /// The selected subtitle precedes the video/audio block, so it has no
    /// kind-relative id; the file's stream order is irregular.
    #[error(
        "Subtitle id {id} precedes the {preceding} video/audio streams; \
         repair the file with the remux workflow first"
    )]
    NotKindRelative { id: u32, preceding: u32 },
}

pub type MappingResult<T> = Result<T, MappingError>;

/// Strategy for choosing one stream of a kind from the candidates.
///
/// The returned id must be the global id of one of `candidates`; callers
/// validate it before use.
pub trait TrackSelector {
    fn select(&self, kind: TrackType, candidates: &[StreamRecord]) -> MappingResult<u32>;
}

/// Selector that always takes the first listed stream of each kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstTrackSelector;

impl TrackSelector for FirstTrackSelector {
    fn select(&self, kind: TrackType, candidates: &[StreamRecord]) -> MappingResult<u32> {
        candidates
            .first()
            .map(|r| r.id)
            .ok_or(MappingError::InvalidSelection { kind, id: 0 })
    }
}

/// Choose one stream per kind and produce the batch mapping.
///
/// Video and audio keep their global ids; the subtitle id is rebased to be
/// kind-relative, since the burn-in filter indexes subtitle streams
/// zero-based within their own kind.
pub fn map_streams(
    inventory: &StreamInventory,
    selector: &dyn TrackSelector,
) -> MappingResult<StreamMapping> {
    let video = select_kind(inventory, TrackType::Video, selector)?;
    let audio = select_kind(inventory, TrackType::Audio, selector)?;
    let subtitle_global = select_kind(inventory, TrackType::Subtitles, selector)?;

    let preceding =
        (inventory.count(TrackType::Video) + inventory.count(TrackType::Audio)) as u32;
    let relative = subtitle_global
        .id
        .checked_sub(preceding)
        .ok_or(MappingError::NotKindRelative {
            id: subtitle_global.id,
            preceding,
        })?;
    debug!(
        "Mapped streams for `{}`: video {}, audio {}, subtitles {} (relative {})",
        inventory.file_name(),
        video.id,
        audio.id,
        subtitle_global.id,
        relative
    );

    Ok(StreamMapping {
        video,
        audio,
        subtitles: SelectedStream {
            id: relative,
            props: subtitle_global.props,
        },
    })
}

fn select_kind(
    inventory: &StreamInventory,
    kind: TrackType,
    selector: &dyn TrackSelector,
) -> MappingResult<SelectedStream> {
    let candidates = inventory.records(kind);
    if candidates.is_empty() {
        return Err(MappingError::NoStreams {
            file: inventory.file_name(),
            kind,
        });
    }

    let id = selector.select(kind, candidates)?;
    let record = candidates
        .iter()
        .find(|r| r.id == id)
        .ok_or(MappingError::InvalidSelection { kind, id })?;

    Ok(SelectedStream {
        id: record.id,
        props: record.props.clone(),
    })
}
