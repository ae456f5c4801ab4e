//! `ffconv` binary: argument parsing, logging setup and dispatch into the
//! core workflows.

mod args;
mod prompt;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use ffconv_core::batch::{
    expand, files_in_dir, resolve_input, resolve_output, resolve_preset_path,
    validate_extension, ExpandRequest, PathEntry,
};
use ffconv_core::command::CommandRunner;
use ffconv_core::logging::init_tracing;
use ffconv_core::models::PathKind;
use ffconv_core::presets::{
    load_audio_preset, load_filter_preset, load_style_preset, load_video_preset, PresetError,
};
use ffconv_core::restyle::StreamSelect;
use ffconv_core::workflow::{
    run_convert, run_fonts, run_remux, run_restyle, FontsRequest, RestyleRequest,
};

use args::{Cli, Command, ConvertArgs, FontsArgs, RemuxArgs, RestyleArgs};
use prompt::PromptSelector;

fn main() {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.log_dir.as_deref());

    if let Err(err) = dispatch(cli.command) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<()> {
    let runner = CommandRunner::new();
    match command {
        Command::Convert(args) => convert(&runner, args),
        Command::Remux(args) => remux(&runner, args),
        Command::Fonts(args) => fonts(&runner, args),
        Command::Restyle(args) => restyle(&runner, args),
    }
}

fn convert(runner: &CommandRunner, args: ConvertArgs) -> Result<()> {
    let inputs = resolve_tokens(&args.input)?;
    let outputs = resolve_outputs(&args.output)?;
    let extension = validate_extension(&args.extension)?;
    let video = load_presets(&args.video_preset, load_video_preset)?;
    let audio = load_presets(&args.audio_preset, load_audio_preset)?;
    let filter = load_presets(&args.filter_preset, load_filter_preset)?;

    let batches = expand(&ExpandRequest {
        inputs: &inputs,
        outputs: &outputs,
        extension: &extension,
        video: &video,
        audio: &audio,
        filter: &filter,
    })?;

    let report = run_convert(runner, &PromptSelector::new(), &batches)?;
    info!("Converted {} file(s)", report.outputs.len());
    Ok(())
}

fn remux(runner: &CommandRunner, args: RemuxArgs) -> Result<()> {
    let files = expand_to_files(&args.input)?;
    let output = resolve_output(&args.output)?;

    let report = run_remux(runner, &files, &output, &args.sort_keys)?;
    if report.consistent {
        info!("All {} file(s) already consistent", files.len());
    } else {
        info!("Remuxed {} file(s)", report.remuxed.len());
    }
    Ok(())
}

fn fonts(runner: &CommandRunner, args: FontsArgs) -> Result<()> {
    let files = expand_to_files(&args.input)?;
    let output = resolve_output(&args.output)?;
    let fonts = resolve_input(&args.fonts)?;

    let outputs = run_fonts(
        runner,
        &FontsRequest {
            inputs: &files,
            output: &output,
            fonts: &fonts,
            replace: args.replace,
        },
    )?;
    info!("Wrote {} file(s)", outputs.len());
    Ok(())
}

fn restyle(runner: &CommandRunner, args: RestyleArgs) -> Result<()> {
    let files = expand_to_files(&args.input)?;
    let output = resolve_output(&args.output)?;
    let preset = load_style_preset(&resolve_preset_path(&args.subtitle_preset)?)?;
    let select = args
        .stream_select
        .as_deref()
        .and_then(|s| s.parse::<StreamSelect>().ok())
        .unwrap_or(StreamSelect::Auto);

    let outputs = run_restyle(
        runner,
        &PromptSelector::new(),
        &RestyleRequest {
            inputs: &files,
            output: &output,
            preset: &preset,
            select: &select,
            overwrite: args.overwrite,
        },
    )?;
    info!("Restyled {} file(s)", outputs.len());
    Ok(())
}

/// Resolve raw input tokens to classified path entries.
fn resolve_tokens(raw: &[String]) -> Result<Vec<PathEntry>> {
    raw.iter()
        .map(|token| Ok(resolve_input(token)?))
        .collect()
}

/// Resolve raw output tokens, creating target directories eagerly.
fn resolve_outputs(raw: &[String]) -> Result<Vec<PathEntry>> {
    raw.iter()
        .map(|token| Ok(resolve_output(token)?))
        .collect()
}

/// Resolve input tokens and flatten directories into their `*.mkv` files.
fn expand_to_files(raw: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in resolve_tokens(raw)? {
        match entry.kind {
            PathKind::File => files.push(entry.path),
            PathKind::Directory => files.extend(files_in_dir(&entry.path, &["mkv"])?),
        }
    }
    Ok(files)
}

/// Load one preset document per token.
fn load_presets<T>(
    raw: &[String],
    loader: impl Fn(&Path) -> Result<T, PresetError>,
) -> Result<Vec<T>> {
    raw.iter()
        .map(|token| {
            let path = resolve_preset_path(token)?;
            Ok(loader(&path)?)
        })
        .collect()
}
