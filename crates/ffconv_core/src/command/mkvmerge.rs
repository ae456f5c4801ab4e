//! mkvmerge / mkvextract command construction.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::fonts::FontFile;
use crate::models::TrackType;

/// Argv for `mkvmerge --identify` with machine-readable output.
pub fn build_identify_args(file: &Path) -> Vec<String> {
    vec![
        "--identify".into(),
        "--identification-format".into(),
        "json".into(),
        file.display().to_string(),
    ]
}

/// One repair remux: tracks to drop per kind and the target track order.
#[derive(Debug, Clone)]
pub struct RemuxJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    /// Global ids to exclude, per kind. Kinds with no removals are omitted
    /// from the command so mkvmerge keeps them untouched.
    pub removals: &'a BTreeMap<TrackType, Vec<u32>>,
    /// Kept global ids in final order (video, audio, subtitles).
    pub order: &'a [u32],
}

/// Build the remux argv: per-kind exclusion lists, the grouped input, and
/// the full track order.
pub fn build_remux_args(job: &RemuxJob<'_>) -> Vec<String> {
    let mut args: Vec<String> = vec!["--output".into(), job.output.display().to_string()];

    for kind in TrackType::ORDERED {
        let Some(ids) = job.removals.get(&kind) else {
            continue;
        };
        if ids.is_empty() {
            continue;
        }
        let list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        args.push(format!("--{}-tracks", kind.flag_name()));
        args.push(format!("!{list}"));
    }

    args.push("(".into());
    args.push(job.input.display().to_string());
    args.push(")".into());
    args.push("--track-order".into());
    args.push(
        job.order
            .iter()
            .map(|id| format!("0:{id}"))
            .collect::<Vec<_>>()
            .join(","),
    );
    args
}

/// One font-injection run.
#[derive(Debug, Clone)]
pub struct AttachJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub fonts: &'a [FontFile],
    /// Drop the existing attachments instead of adding alongside them.
    pub replace: bool,
}

/// Build the attach argv: name/mime/file triplet per font, after the input
/// so mkvmerge treats them as additions to the copied container.
pub fn build_attach_args(job: &AttachJob<'_>) -> Vec<String> {
    let mut args: Vec<String> = vec!["-o".into(), job.output.display().to_string()];
    if job.replace {
        args.push("--no-attachments".into());
    }
    args.push(job.input.display().to_string());
    for font in job.fonts {
        args.push("--attachment-name".into());
        args.push(font.file_name.clone());
        args.push("--attachment-mime-type".into());
        args.push(font.mime_type.to_string());
        args.push("--attach-file".into());
        args.push(font.path.display().to_string());
    }
    args
}

/// Argv for `mkvextract`: dump tracks and attachments to target paths in a
/// single invocation. Empty sections are omitted.
pub fn build_extract_args(
    input: &Path,
    tracks: &[(u32, PathBuf)],
    attachments: &[(u32, PathBuf)],
) -> Vec<String> {
    let mut args: Vec<String> = vec![input.display().to_string()];
    if !tracks.is_empty() {
        args.push("tracks".into());
        for (id, path) in tracks {
            args.push(format!("{}:{}", id, path.display()));
        }
    }
    if !attachments.is_empty() {
        args.push("attachments".into());
        for (id, path) in attachments {
            args.push(format!("{}:{}", id, path.display()));
        }
    }
    args
}

/// One restyle remux: replace all subtitle tracks with a single styled one.
#[derive(Debug, Clone)]
pub struct RestyleJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub subtitle: &'a Path,
    /// Language tag carried over from the source track, if it had one.
    pub language: Option<&'a str>,
    /// Track name carried over from the source track, if it had one.
    pub track_name: Option<&'a str>,
}

/// Build the restyle argv: source container minus its subtitles, then the
/// styled track appended. Attachments are copied with the container, so
/// embedded fonts survive.
pub fn build_restyle_args(job: &RestyleJob<'_>) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-o".into(),
        job.output.display().to_string(),
        "--no-subtitles".into(),
        job.input.display().to_string(),
    ];
    if let Some(lang) = job.language {
        args.push("--language".into());
        args.push(format!("0:{lang}"));
    }
    if let Some(name) = job.track_name {
        args.push("--track-name".into());
        args.push(format!("0:{name}"));
    }
    args.push(job.subtitle.display().to_string());
    args
}
