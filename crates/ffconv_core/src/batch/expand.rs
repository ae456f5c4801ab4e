//! Batch expansion: assigning outputs and presets to input batches.
//!
//! For every argument category independently, with `n` input tokens and
//! `m` supplied values:
//!
//! - `m == n`: one value per batch, positionally (batch i takes value i)
//! - `m == 1`: the single value replicates to every batch
//! - anything else is a hard configuration error
//!
//! Within a batch, a directory token that expanded to K files replicates
//! the chosen value K times, except that one explicit output *file* cannot
//! absorb several source files.

use std::path::PathBuf;

use super::{paths::sanitize_batch, BatchError, BatchResult, PathEntry};
use crate::models::PathKind;
use crate::presets::{AudioPolicy, FilterPreset, VideoPreset};

/// One fully specified unit of work: a single CLI input token with its
/// expanded files, per-file output paths, and per-batch presets.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// 1-based ordinal among the CLI input tokens.
    pub batch_index: usize,
    /// Display name of the original token (for reporting).
    pub batch_name: String,
    /// Physical input files, in directory-traversal order.
    pub input_files: Vec<PathBuf>,
    /// Output path for each input file, same length as `input_files`.
    pub output_files: Vec<PathBuf>,
    /// Video preset applied to every file in the batch.
    pub video: VideoPreset,
    /// Audio policy applied to every file in the batch.
    pub audio: AudioPolicy,
    /// Filter fragments applied to every file in the batch.
    pub filter: FilterPreset,
}

/// Inputs to `expand`, after path resolution and preset loading.
#[derive(Debug)]
pub struct ExpandRequest<'a> {
    pub inputs: &'a [PathEntry],
    pub outputs: &'a [PathEntry],
    /// Normalized output extension without the leading dot.
    pub extension: &'a str,
    /// Empty slice means "use the baseline preset for every batch".
    pub video: &'a [VideoPreset],
    /// Empty slice means "decide per mapped audio codec".
    pub audio: &'a [crate::presets::AudioPreset],
    /// Empty slice means "no extra filter fragments".
    pub filter: &'a [FilterPreset],
}

/// Assign a value list to batches under the positional/replicated rule.
///
/// Consumption is by index cursor, so batch order and value order always
/// agree; the value list itself is never mutated.
pub fn assign_per_batch<T: Clone>(
    what: &'static str,
    values: &[T],
    n_batches: usize,
) -> BatchResult<Vec<T>> {
    match values.len() {
        m if m == n_batches => Ok(values.to_vec()),
        1 => Ok(vec![values[0].clone(); n_batches]),
        m => Err(BatchError::ArgumentCountMismatch {
            what,
            inputs: n_batches,
            got: m,
        }),
    }
}

/// Expand CLI arguments into one `BatchItem` per input token.
///
/// Side effect: input directories are scanned and their files renamed to
/// strip quote characters (see `sanitize_batch`).
pub fn expand(req: &ExpandRequest<'_>) -> BatchResult<Vec<BatchItem>> {
    let n = req.inputs.len();

    let outputs = assign_per_batch("output", req.outputs, n)?;

    let videos = if req.video.is_empty() {
        vec![VideoPreset::default_h264(); n]
    } else {
        assign_per_batch("video preset", req.video, n)?
    };
    let audios = if req.audio.is_empty() {
        vec![AudioPolicy::Auto; n]
    } else {
        assign_per_batch("audio preset", req.audio, n)?
            .into_iter()
            .map(AudioPolicy::Preset)
            .collect()
    };
    let filters = if req.filter.is_empty() {
        vec![FilterPreset::default(); n]
    } else {
        assign_per_batch("filter preset", req.filter, n)?
    };

    let mut batches = Vec::with_capacity(n);
    for (i, input) in req.inputs.iter().enumerate() {
        let input_files = sanitize_batch(input)?;
        let output = &outputs[i];

        if input.kind == PathKind::Directory
            && output.kind == PathKind::File
            && input_files.len() > 1
        {
            return Err(BatchError::AmbiguousOutput {
                dir: input.path.clone(),
                files: input_files.len(),
            });
        }

        let output_files = input_files
            .iter()
            .map(|file| compose_output(file, output, req.extension))
            .collect();

        batches.push(BatchItem {
            batch_index: i + 1,
            batch_name: input
                .path
                .file_name()
                .map(|nm| nm.to_string_lossy().to_string())
                .unwrap_or_else(|| input.path.display().to_string()),
            input_files,
            output_files,
            video: videos[i].clone(),
            audio: audios[i].clone(),
            filter: filters[i].clone(),
        });
    }

    Ok(batches)
}

/// Compose the output path for one input file.
///
/// Directory targets keep the input stem; file targets only swap the
/// suffix (safe because the ambiguity guard already rejected multi-file
/// batches with an explicit output file).
fn compose_output(input: &PathBuf, output: &PathEntry, extension: &str) -> PathBuf {
    match output.kind {
        PathKind::Directory => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            output.path.join(format!("{}.{}", stem, extension))
        }
        PathKind::File => output.path.with_extension(extension),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::AudioPreset;
    use tempfile::tempdir;

    fn touch(path: &std::path::Path) {
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn assign_positional_preserves_order() {
        let assigned = assign_per_batch("output", &["a", "b", "c"], 3).unwrap();
        assert_eq!(assigned, vec!["a", "b", "c"]);
    }

    #[test]
    fn assign_replicates_single_value() {
        let assigned = assign_per_batch("output", &["only"], 4).unwrap();
        assert_eq!(assigned, vec!["only"; 4]);
    }

    #[test]
    fn assign_rejects_other_lengths() {
        let err = assign_per_batch("video preset", &["a", "b"], 3).unwrap_err();
        match err {
            BatchError::ArgumentCountMismatch { what, inputs, got } => {
                assert_eq!(what, "video preset");
                assert_eq!(inputs, 3);
                assert_eq!(got, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn every_batch_gets_a_preset() {
        let dir = tempdir().unwrap();
        let out = tempdir().unwrap();
        let mut inputs = Vec::new();
        for name in ["a.mkv", "b.mkv", "c.mkv"] {
            let p = dir.path().join(name);
            touch(&p);
            inputs.push(PathEntry::file(p));
        }

        let presets = vec![AudioPreset::default_aac()];
        let req = ExpandRequest {
            inputs: &inputs,
            outputs: &[PathEntry::directory(out.path())],
            extension: "mp4",
            video: &[],
            audio: &presets,
            filter: &[],
        };

        let batches = expand(&req).unwrap();
        assert_eq!(batches.len(), 3);
        for batch in &batches {
            assert_eq!(batch.audio, AudioPolicy::Preset(AudioPreset::default_aac()));
            assert_eq!(batch.video, VideoPreset::default_h264());
        }
    }

    #[test]
    fn directory_into_single_output_file_is_ambiguous() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("e1.mkv"));
        touch(&dir.path().join("e2.mkv"));

        let req = ExpandRequest {
            inputs: &[PathEntry::directory(dir.path())],
            outputs: &[PathEntry::file("/out/movie.mp4")],
            extension: "mp4",
            video: &[],
            audio: &[],
            filter: &[],
        };

        assert!(matches!(
            expand(&req),
            Err(BatchError::AmbiguousOutput { files: 2, .. })
        ));
    }

    #[test]
    fn directory_into_output_directory_fans_out() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("e1.mkv"));
        touch(&dir.path().join("e2.mkv"));
        let out = tempdir().unwrap();

        let req = ExpandRequest {
            inputs: &[PathEntry::directory(dir.path())],
            outputs: &[PathEntry::directory(out.path())],
            extension: "mp4",
            video: &[],
            audio: &[],
            filter: &[],
        };

        let batches = expand(&req).unwrap();
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.input_files.len(), 2);
        assert_eq!(batch.output_files.len(), 2);

        let mut stems: Vec<String> = batch
            .output_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        stems.sort();
        assert_eq!(stems, vec!["e1.mp4", "e2.mp4"]);
        assert!(batch.output_files.iter().all(|p| p.parent().unwrap() == out.path()));
    }

    #[test]
    fn explicit_output_file_swaps_suffix() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("movie.mkv");
        touch(&input);

        let req = ExpandRequest {
            inputs: &[PathEntry::file(&input)],
            outputs: &[PathEntry::file("/out/renamed.mkv")],
            extension: "mp4",
            video: &[],
            audio: &[],
            filter: &[],
        };

        let batches = expand(&req).unwrap();
        assert_eq!(batches[0].output_files[0], PathBuf::from("/out/renamed.mp4"));
    }

    #[test]
    fn positional_outputs_follow_batch_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mkv");
        let b = dir.path().join("b.mkv");
        touch(&a);
        touch(&b);

        let req = ExpandRequest {
            inputs: &[PathEntry::file(&a), PathEntry::file(&b)],
            outputs: &[PathEntry::file("/out/first.mp4"), PathEntry::file("/out/second.mp4")],
            extension: "mp4",
            video: &[],
            audio: &[],
            filter: &[],
        };

        let batches = expand(&req).unwrap();
        assert_eq!(batches[0].output_files[0], PathBuf::from("/out/first.mp4"));
        assert_eq!(batches[1].output_files[0], PathBuf::from("/out/second.mp4"));
    }
}
