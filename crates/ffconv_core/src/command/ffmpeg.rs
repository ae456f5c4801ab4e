//! ffmpeg command construction for the hardcode conversion.

use std::path::{Path, PathBuf};

use crate::models::StreamMapping;
use crate::presets::{AudioPreset, FilterPreset, VideoPreset};

/// Everything needed to build one conversion command line.
#[derive(Debug, Clone)]
pub struct ConvertJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub mapping: &'a StreamMapping,
    pub video: &'a VideoPreset,
    pub audio: &'a AudioPreset,
    pub filter: &'a FilterPreset,
    /// Local wall-clock timestamp, `%Y-%m-%d %H:%M:%S`, stamped into the
    /// container comment. Passed in so the builder stays deterministic.
    pub timestamp: &'a str,
}

/// Escape a path for interpolation into a single-quoted `subtitles=`
/// filter argument. Backslashes first, then colons, so Windows drive
/// prefixes survive the filter parser.
pub fn escape_filter_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
}

/// Build the full ffmpeg argv (without the program name).
///
/// The video stream is consumed through the filter graph, the audio stream
/// through an explicit map; the subtitle stream is addressed kind-relative
/// inside the filter. Output last, `-y` so re-runs overwrite.
pub fn build_convert_args(job: &ConvertJob<'_>) -> Vec<String> {
    let title = job
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-i".into(),
        job.input.display().to_string(),
        "-metadata".into(),
        format!("title={title}"),
        "-metadata".into(),
        format!("comment=Encoded on {}", job.timestamp),
        "-map".into(),
        format!("0:{}", job.mapping.audio.id),
        "-filter_complex".into(),
        filter_graph(job),
    ];

    args.extend(job.video.to_args());
    args.extend(job.audio.to_args());
    args.push("-movflags".into());
    args.push("faststart".into());
    args.push(job.output.display().to_string());
    args
}

/// The `-filter_complex` expression: optional fragments around the
/// subtitles burn-in core.
fn filter_graph(job: &ConvertJob<'_>) -> String {
    let mut graph = format!("[0:{}]", job.mapping.video.id);
    if let Some(before) = job.filter.before_fragment() {
        graph.push_str(&before);
        graph.push(',');
    }
    graph.push_str(&format!(
        "subtitles='{}':si={}",
        escape_filter_path(job.input),
        job.mapping.subtitles.id
    ));
    if let Some(after) = job.filter.after_fragment() {
        graph.push(',');
        graph.push_str(&after);
    }
    graph
}

/// Derive the attachments extraction directory for a file (used by the
/// restyle flow): sibling directory named `<stem>_attachments`.
pub fn attachments_dir(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_attachments"))
}
