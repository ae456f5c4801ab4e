//! Shared data structures for batch processing and stream handling.

mod enums;
mod media;

pub use enums::{PathKind, TrackType};
pub use media::{
    sanitized_file_name, AttachmentRecord, Mapping, SelectedStream, StreamInventory,
    StreamMapping, StreamProps, StreamRecord,
};
