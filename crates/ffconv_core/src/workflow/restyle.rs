//! The ASS restyle workflow.
//!
//! Per file: pick the subtitle track, extract it together with the font
//! attachments into a `<stem>_attachments` work directory, rescale and
//! restyle the script, then remux it back in place of the original
//! subtitle tracks.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use super::{remux_output, run_mkvmerge, WorkflowResult, MKVEXTRACT, REMUX_SUFFIX};
use crate::batch::PathEntry;
use crate::command::{attachments_dir, build_extract_args, build_restyle_args, RestyleJob, ToolRunner};
use crate::mapping::{MappingError, TrackSelector};
use crate::models::TrackType;
use crate::presets::StylePreset;
use crate::probe::identify;
use crate::restyle::{
    subtitle_extension, video_resolution, AssDocument, RestyleError, StreamSelect,
};

/// Inputs to a restyle run.
#[derive(Debug)]
pub struct RestyleRequest<'a> {
    pub inputs: &'a [PathBuf],
    pub output: &'a PathEntry,
    pub preset: &'a StylePreset,
    pub select: &'a StreamSelect,
    /// Name the output like the input instead of suffixing it.
    pub overwrite: bool,
}

/// Restyle every input file.
pub fn run_restyle(
    runner: &dyn ToolRunner,
    selector: &dyn TrackSelector,
    request: &RestyleRequest<'_>,
) -> WorkflowResult<Vec<PathBuf>> {
    let mut outputs = Vec::with_capacity(request.inputs.len());
    for input in request.inputs {
        outputs.push(restyle_file(runner, selector, request, input)?);
    }
    Ok(outputs)
}

fn restyle_file(
    runner: &dyn ToolRunner,
    selector: &dyn TrackSelector,
    request: &RestyleRequest<'_>,
    input: &PathBuf,
) -> WorkflowResult<PathBuf> {
    let inventory = identify(runner, input)?;
    let candidates = inventory.records(TrackType::Subtitles);
    if candidates.is_empty() {
        return Err(MappingError::NoStreams {
            file: inventory.file_name(),
            kind: TrackType::Subtitles,
        }
        .into());
    }

    let id = match request.select.resolve(candidates)? {
        Some(id) => id,
        None => selector.select(TrackType::Subtitles, candidates)?,
    };
    let record = candidates
        .iter()
        .find(|r| r.id == id)
        .ok_or(MappingError::InvalidSelection {
            kind: TrackType::Subtitles,
            id,
        })?;

    let extension = subtitle_extension(&record.props.codec_id)?;
    if extension != "ass" {
        return Err(RestyleError::UnsupportedCodec(record.props.codec_id.clone()).into());
    }

    // Extract the track and all fonts into the sibling work directory.
    let work_dir = attachments_dir(input);
    fs::create_dir_all(&work_dir)
        .map_err(|e| super::WorkflowError::io(format!("creating `{}`", work_dir.display()), e))?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let language = record.props.language.clone().unwrap_or_else(|| "und".into());
    let track_path = work_dir.join(format!("{stem}_track{id}_{language}.{extension}"));
    let attachments: Vec<(u32, PathBuf)> = inventory
        .attachments
        .iter()
        .map(|a| (a.id, work_dir.join(&a.file_name)))
        .collect();
    runner.run(
        MKVEXTRACT,
        &build_extract_args(input, &[(id, track_path.clone())], &attachments),
    )?;

    // Restyle the extracted script.
    let content = fs::read_to_string(&track_path)
        .map_err(|e| super::WorkflowError::io(format!("reading `{}`", track_path.display()), e))?;
    let mut doc = AssDocument::parse(&content);
    let (width, height) = video_resolution(runner, input)?;
    if let Some((x, y)) = doc.play_res() {
        if (x, y) != (width, height) {
            info!("Rescaling script resolution {x}x{y} -> {width}x{height}");
        }
    }
    doc.set_play_res(width, height);
    doc.apply_style_rules(request.preset)?;
    doc.prune_unused_styles();
    doc.set_render_defaults();

    let styled_path = work_dir.join(format!("{stem}_restyled.{extension}"));
    fs::write(&styled_path, doc.to_string())
        .map_err(|e| super::WorkflowError::io(format!("writing `{}`", styled_path.display()), e))?;

    // Remux: original container minus subtitles, styled track appended.
    let suffix = if request.overwrite { "" } else { REMUX_SUFFIX };
    let target = remux_output(input, request.output, suffix);
    info!("`{}` -> `{}`", input.display(), target.display());
    let job = RestyleJob {
        input,
        output: &target,
        subtitle: &styled_path,
        language: record.props.language.as_deref(),
        track_name: record.props.track_name.as_deref(),
    };
    run_mkvmerge(runner, &build_restyle_args(&job))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FirstTrackSelector;
    use crate::presets::StyleRule;
    use crate::workflow::testing::ScriptedRunner;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    const IDENTIFY: &str = r#"{"errors": [], "tracks": [
        {"id": 0, "type": "video", "properties": {"codec_id": "V_MPEG4/ISO/AVC"}},
        {"id": 1, "type": "audio", "properties": {"codec_id": "A_AAC"}},
        {"id": 2, "type": "subtitles",
         "properties": {"codec_id": "S_TEXT/ASS", "language": "eng", "track_name": "Full"}}
    ], "attachments": [{"id": 1, "file_name": "font.ttf"}]}"#;

    const FFPROBE: &str = r#"{"streams": [{"width": 1920, "height": 1080}]}"#;

    const SCRIPT: &str = "\
[Script Info]
PlayResX: 1280
PlayResY: 720

[V4+ Styles]
Format: Name, Fontname, Fontsize
Style: Default,Open Sans,48

[Events]
Format: Layer, Start, End, Style, Name, Text
Dialogue: 0,0:00:00.00,0:00:05.00,Default,,Hello
";

    #[test]
    fn restyles_and_remuxes_with_carried_track_metadata() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("ep.mkv");
        std::fs::write(&input, b"x").unwrap();

        // Pre-seed what mkvextract would have produced.
        let work_dir = dir.path().join("ep_attachments");
        std::fs::create_dir_all(&work_dir).unwrap();
        std::fs::write(work_dir.join("ep_track2_eng.ass"), SCRIPT).unwrap();

        let runner = ScriptedRunner::new();
        runner.push_stdout("mkvmerge", IDENTIFY);
        runner.push_stdout("ffprobe", FFPROBE);

        let mut rules = BTreeMap::new();
        rules.insert(
            "Fontsize".to_string(),
            StyleRule::Scale {
                factor: 2.0,
                round: true,
            },
        );
        let preset = StylePreset { rules };
        let inputs = vec![input.clone()];
        let output = PathEntry::directory("/out");
        let request = RestyleRequest {
            inputs: &inputs,
            output: &output,
            preset: &preset,
            select: &StreamSelect::Language("eng".into()),
            overwrite: false,
        };

        let outputs = run_restyle(&runner, &FirstTrackSelector, &request).unwrap();
        assert_eq!(outputs, vec![PathBuf::from("/out/ep (1).mkv")]);

        // Extraction asked for the track and the font attachment.
        let extract = &runner.calls_for("mkvextract")[0];
        assert!(extract.iter().any(|a| a.ends_with("ep_track2_eng.ass")));
        assert!(extract.iter().any(|a| a.ends_with("font.ttf")));

        // The styled script was written with scaled fontsize and the new
        // resolution.
        let styled =
            std::fs::read_to_string(work_dir.join("ep_restyled.ass")).unwrap();
        assert!(styled.contains("PlayResX: 1920"));
        assert!(styled.contains("Style: Default,Open Sans,96"));

        // The final remux drops original subtitles and tags the new track.
        let calls = runner.calls_for("mkvmerge");
        let remux = calls.last().unwrap();
        assert!(remux.contains(&"--no-subtitles".to_string()));
        assert!(remux.windows(2).any(|w| w == ["--language", "0:eng"]));
        assert!(remux.windows(2).any(|w| w == ["--track-name", "0:Full"]));
    }

    #[test]
    fn image_subtitles_are_rejected() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("ep.mkv");
        std::fs::write(&input, b"x").unwrap();

        let runner = ScriptedRunner::new();
        runner.push_stdout(
            "mkvmerge",
            r#"{"errors": [], "tracks": [
                {"id": 0, "type": "subtitles", "properties": {"codec_id": "S_HDMV/PGS"}}
            ], "attachments": []}"#,
        );

        let preset = StylePreset::default();
        let inputs = vec![input];
        let output = PathEntry::directory("/out");
        let request = RestyleRequest {
            inputs: &inputs,
            output: &output,
            preset: &preset,
            select: &StreamSelect::Auto,
            overwrite: false,
        };

        let err = run_restyle(&runner, &FirstTrackSelector, &request).unwrap_err();
        assert!(err.to_string().contains("S_HDMV/PGS".to_lowercase().as_str()));
        assert!(runner.calls_for("mkvextract").is_empty());
    }
}
