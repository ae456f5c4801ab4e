//! Command line definition.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ffconv",
    version,
    about = "Batch MKV conversion with hardcoded subtitles, track repair, \
             font injection and ASS restyling"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write daily-rotated log files into this directory
    #[arg(long = "log-dir", global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert MKV files to MP4 with the selected subtitle burned in
    Convert(ConvertArgs),
    /// Repair a batch: drop surplus tracks and normalize track order
    Remux(RemuxArgs),
    /// Attach font files to MKV containers
    Fonts(FontsArgs),
    /// Restyle the embedded ASS subtitle of MKV files
    Restyle(RestyleArgs),
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input files or directories
    #[arg(short = 'i', long = "input", required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output files or directories (1 or one per input)
    #[arg(short = 'o', long = "output", required = true, num_args = 1..)]
    pub output: Vec<String>,

    /// Output container extension
    #[arg(short = 'e', long = "extension", default_value = "mp4")]
    pub extension: String,

    /// JSON video preset files (1 or one per input)
    #[arg(long = "video-preset", visible_alias = "vp", num_args = 1..)]
    pub video_preset: Vec<String>,

    /// JSON audio preset files (1 or one per input)
    #[arg(long = "audio-preset", visible_alias = "ap", num_args = 1..)]
    pub audio_preset: Vec<String>,

    /// JSON filter preset files (1 or one per input)
    #[arg(long = "filter-preset", visible_alias = "fp", num_args = 1..)]
    pub filter_preset: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RemuxArgs {
    /// Input files or directories forming one batch
    #[arg(short = 'i', long = "input", required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output directory (or file for a single input)
    #[arg(short = 'o', long = "output", required = true)]
    pub output: String,

    /// Stream properties ordering kept tracks within each kind
    #[arg(short = 's', long = "sort-key", num_args = 1.., default_values = ["track_name"])]
    pub sort_keys: Vec<String>,
}

#[derive(Args, Debug)]
pub struct FontsArgs {
    /// Input files or directories
    #[arg(short = 'i', long = "input", required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output directory (or file for a single input)
    #[arg(short = 'o', long = "output", required = true)]
    pub output: String,

    /// Font file or directory of fonts to attach
    #[arg(short = 'f', long = "fonts", required = true)]
    pub fonts: String,

    /// Replace existing attachments instead of adding to them
    #[arg(long = "replace")]
    pub replace: bool,
}

#[derive(Args, Debug)]
pub struct RestyleArgs {
    /// Input files or directories
    #[arg(short = 'i', long = "input", required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output directory (or file for a single input)
    #[arg(short = 'o', long = "output", required = true)]
    pub output: String,

    /// JSON subtitle styling preset
    #[arg(long = "subtitle-preset", visible_alias = "sp", required = true)]
    pub subtitle_preset: String,

    /// Subtitle stream override: numeric id or language code
    #[arg(long = "stream-select", visible_alias = "ss")]
    pub stream_select: Option<String>,

    /// Name outputs like the inputs instead of adding a suffix
    #[arg(short = 'w', long = "overwrite")]
    pub overwrite: bool,
}
