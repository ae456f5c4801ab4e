//! External tool invocation.
//!
//! The builders in `ffmpeg` and `mkvmerge` are pure functions from typed
//! inputs to argv token vectors, so the exact command lines are unit
//! testable without the tools installed. `runner` is the single place that
//! actually spawns processes.

mod ffmpeg;
mod mkvmerge;
mod runner;

pub use ffmpeg::{attachments_dir, build_convert_args, escape_filter_path, ConvertJob};
pub use mkvmerge::{
    build_attach_args, build_extract_args, build_identify_args, build_remux_args,
    build_restyle_args, AttachJob, RemuxJob, RestyleJob,
};
pub use runner::{CommandOutput, CommandRunner, RunnerError, RunnerResult, ToolRunner};
