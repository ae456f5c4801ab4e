//! The font attachment workflow.

use std::path::PathBuf;

use tracing::info;

use super::{remux_output, run_mkvmerge, WorkflowResult, REMUX_SUFFIX};
use crate::batch::PathEntry;
use crate::command::{build_attach_args, AttachJob, ToolRunner};
use crate::fonts::{collect_fonts, font_file, FontFile};
use crate::models::PathKind;

/// Inputs to a fonts run.
#[derive(Debug)]
pub struct FontsRequest<'a> {
    pub inputs: &'a [PathBuf],
    pub output: &'a PathEntry,
    /// A single font file or a directory of fonts.
    pub fonts: &'a PathEntry,
    /// Drop existing attachments instead of adding alongside them.
    pub replace: bool,
}

/// Attach the fonts to every input, one remux each.
///
/// Font collection happens once, before any remux, so an unsupported file
/// in the fonts directory fails the run with no partial outputs.
pub fn run_fonts(
    runner: &dyn ToolRunner,
    request: &FontsRequest<'_>,
) -> WorkflowResult<Vec<PathBuf>> {
    let fonts: Vec<FontFile> = match request.fonts.kind {
        PathKind::File => vec![font_file(&request.fonts.path)?],
        PathKind::Directory => collect_fonts(&request.fonts.path)?,
    };
    info!("Attaching {} font(s)", fonts.len());

    let mut outputs = Vec::with_capacity(request.inputs.len());
    for input in request.inputs {
        let target = remux_output(input, request.output, REMUX_SUFFIX);
        info!("`{}` -> `{}`", input.display(), target.display());
        let job = AttachJob {
            input,
            output: &target,
            fonts: &fonts,
            replace: request.replace,
        };
        run_mkvmerge(runner, &build_attach_args(&job))?;
        outputs.push(target);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::ScriptedRunner;
    use tempfile::tempdir;

    #[test]
    fn attaches_collected_fonts_to_every_input() {
        let fonts_dir = tempdir().unwrap();
        std::fs::write(fonts_dir.path().join("a.ttf"), b"x").unwrap();
        std::fs::write(fonts_dir.path().join("b.otf"), b"x").unwrap();

        let runner = ScriptedRunner::new();
        let inputs = vec![PathBuf::from("/m/e1.mkv"), PathBuf::from("/m/e2.mkv")];
        let fonts = PathEntry::directory(fonts_dir.path());
        let output = PathEntry::directory("/out");
        let request = FontsRequest {
            inputs: &inputs,
            output: &output,
            fonts: &fonts,
            replace: false,
        };

        let outputs = run_fonts(&runner, &request).unwrap();
        assert_eq!(outputs[0], PathBuf::from("/out/e1 (1).mkv"));
        assert_eq!(outputs[1], PathBuf::from("/out/e2 (1).mkv"));

        let calls = runner.calls_for("mkvmerge");
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].contains(&"--no-attachments".to_string()));
        // Both fonts on each call, sorted by name.
        let attach_names: Vec<&String> = calls[0]
            .windows(2)
            .filter(|w| w[0] == "--attachment-name")
            .map(|w| &w[1])
            .collect();
        assert_eq!(attach_names, ["a.ttf", "b.otf"]);
    }

    #[test]
    fn replace_mode_drops_existing_attachments() {
        let fonts_dir = tempdir().unwrap();
        std::fs::write(fonts_dir.path().join("a.ttf"), b"x").unwrap();

        let runner = ScriptedRunner::new();
        let inputs = vec![PathBuf::from("/m/e1.mkv")];
        let fonts = PathEntry::directory(fonts_dir.path());
        let output = PathEntry::directory("/out");
        let request = FontsRequest {
            inputs: &inputs,
            output: &output,
            fonts: &fonts,
            replace: true,
        };

        run_fonts(&runner, &request).unwrap();
        let calls = runner.calls_for("mkvmerge");
        assert!(calls[0].contains(&"--no-attachments".to_string()));
    }

    #[test]
    fn bad_font_path_fails_before_any_remux() {
        let runner = ScriptedRunner::new();
        let inputs = vec![PathBuf::from("/m/e1.mkv")];
        let fonts = PathEntry::file("/fonts/not-a-font.zip");
        let output = PathEntry::directory("/out");
        let request = FontsRequest {
            inputs: &inputs,
            output: &output,
            fonts: &fonts,
            replace: false,
        };

        assert!(run_fonts(&runner, &request).is_err());
        assert!(runner.calls_for("mkvmerge").is_empty());
    }
}
