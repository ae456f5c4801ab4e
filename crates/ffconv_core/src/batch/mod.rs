//! Batch argument reconciliation.
//!
//! This module turns heterogeneous CLI arguments (N inputs, M outputs and
//! presets, files or directories) into one fully specified work unit per
//! input token:
//!
//! - **paths**: resolves and classifies path tokens, expands directories
//!   into `*.mkv` leaves and sanitizes file names for later filter quoting
//! - **expand**: the combinatorial assignment of outputs and presets to
//!   batches, with positional (m == n) and replicated (m == 1) rules

mod expand;
mod paths;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use expand::{assign_per_batch, expand, BatchItem, ExpandRequest};
pub use paths::{
    files_in_dir, resolve_input, resolve_output, resolve_preset_path, sanitize_batch,
    validate_extension, PathEntry, VIDEO_EXTENSIONS,
};

/// Errors raised during argument resolution and batch expansion.
///
/// All of these fire before any external process is started.
#[derive(Error, Debug)]
pub enum BatchError {
    /// An input or preset path does not exist.
    #[error("The specified path `{0}` does not exist")]
    PathNotFound(PathBuf),

    /// A preset path resolved to a directory instead of a file.
    #[error("The preset path `{0}` is not a file")]
    NotAFile(PathBuf),

    /// Argument list length is neither 1 nor the number of input tokens.
    #[error(
        "Amount of input arguments ({inputs}) does not equal the amount of {what} arguments ({got})"
    )]
    ArgumentCountMismatch {
        what: &'static str,
        inputs: usize,
        got: usize,
    },

    /// A multi-file directory cannot be mapped onto one explicit output file.
    #[error(
        "The path `{dir}` contains {files} files but only 1 output filename was specified; \
         pass an output directory instead, or list the files as separate inputs"
    )]
    AmbiguousOutput { dir: PathBuf, files: usize },

    /// The requested output extension is not a known video extension.
    #[error("The specified output extension `{0}` is not a valid video extension")]
    InvalidExtension(String),

    /// Filesystem error with operation context.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl BatchError {
    pub(crate) fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;
