//! Core library for the `ffconv` tool family: batch MKV conversion with
//! hardcoded subtitles, track repair remuxing, font attachment injection
//! and ASS restyling, all orchestrated over ffmpeg and the mkvtoolnix
//! binaries.
//!
//! The layering is strict: `models` and `presets` are plain data,
//! `batch`/`probe`/`mapping`/`reconcile`/`restyle` are pure logic over
//! that data, `command` turns decisions into argv vectors, and `workflow`
//! is the only layer that drives external processes (through the
//! `ToolRunner` seam).

pub mod batch;
pub mod command;
pub mod fonts;
pub mod logging;
pub mod mapping;
pub mod models;
pub mod presets;
pub mod probe;
pub mod reconcile;
pub mod restyle;
pub mod workflow;
