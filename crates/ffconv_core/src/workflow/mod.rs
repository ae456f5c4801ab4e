//! End-to-end workflows: convert, remux, fonts, restyle.
//!
//! Each workflow ties resolution, probing and command building together
//! and drives the external tools through an injected `ToolRunner`.

mod convert;
mod fonts;
mod remux;
mod restyle;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::batch::{BatchError, PathEntry};
use crate::command::{RunnerError, ToolRunner};
use crate::fonts::FontError;
use crate::mapping::MappingError;
use crate::models::PathKind;
use crate::presets::PresetError;
use crate::probe::ProbeError;
use crate::reconcile::ReconcileError;
use crate::restyle::RestyleError;

pub use convert::{run_convert, ConvertReport};
pub use fonts::{run_fonts, FontsRequest};
pub use remux::{run_remux, RemuxReport};
pub use restyle::{run_restyle, RestyleRequest};

pub const MKVMERGE: &str = "mkvmerge";
pub const MKVEXTRACT: &str = "mkvextract";
pub const FFMPEG: &str = "ffmpeg";

/// Suffix appended to remuxed output names so a run into the source
/// directory never clobbers its input.
pub const REMUX_SUFFIX: &str = " (1)";

/// Umbrella error for a workflow run.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Preset(#[from] PresetError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error(transparent)]
    Restyle(#[from] RestyleError),

    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl WorkflowError {
    pub(crate) fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Output path for a remux-style workflow: explicit file targets are used
/// as-is, directory targets get `stem + suffix + .mkv`.
pub(crate) fn remux_output(input: &Path, output: &PathEntry, suffix: &str) -> PathBuf {
    match output.kind {
        PathKind::File => output.path.clone(),
        PathKind::Directory => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            output.path.join(format!("{stem}{suffix}.mkv"))
        }
    }
}

/// Run mkvmerge tolerating its warning exit status (1): the output file is
/// still written, so warnings are logged and the run continues.
pub(crate) fn run_mkvmerge(runner: &dyn ToolRunner, args: &[String]) -> WorkflowResult<()> {
    let output = runner.run_unchecked(MKVMERGE, args)?;
    match output.code {
        0 => Ok(()),
        1 => {
            warn!("mkvmerge finished with warnings: {}", output.stderr.trim());
            Ok(())
        }
        code => Err(WorkflowError::Runner(RunnerError::NonZeroExit {
            tool: MKVMERGE.to_string(),
            code,
            stderr: output.stderr,
        })),
    }
}
