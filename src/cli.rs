use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "telecue")]
#[command(about = "Teleprompter playback engine: inspect, convert and simulate timed scripts.")]
pub struct Args {
    /// Path to config TOML (defaults to ./telecue.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the segment timeline of a script
    Timeline(TimelineCmd),
    /// Convert a script between formats
    Convert(ConvertCmd),
    /// Run a headless playback session over a script
    Simulate(SimulateCmd),
    /// Print the effective default config as TOML and exit
    PrintDefaultConfig,
}

#[derive(Debug, ClapArgs)]
pub struct InputArgs {
    /// Input file path, or '-' for stdin
    pub input: String,

    /// Force input format (otherwise inferred from extension or content)
    #[arg(long, value_enum)]
    pub from: Option<Format>,
}

#[derive(Debug, Parser)]
pub struct TimelineCmd {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Parser)]
pub struct ConvertCmd {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output file path (optional)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Target format
    #[arg(long, value_enum)]
    pub to: Format,

    /// Write to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,

    /// Allow overwriting output file
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Parser)]
pub struct SimulateCmd {
    #[command(flatten)]
    pub input: InputArgs,

    /// Speed multiplier (overrides config)
    #[arg(long)]
    pub speed: Option<f64>,

    /// Simulated frame interval in milliseconds
    #[arg(long, default_value_t = 16.0)]
    pub frame_ms: f64,

    /// JSON list of scripted user actions: scroll, play, pause, stop
    #[arg(long)]
    pub gestures: Option<PathBuf>,

    /// Record the gestures as the script's automation track
    #[arg(long, conflicts_with = "automation")]
    pub record: bool,

    /// Re-record from this elapsed time onward, keeping the earlier keyframes
    #[arg(long, conflicts_with_all = ["automation", "record"])]
    pub punch_in_at: Option<f64>,

    /// Replay the stored automation track instead of timed scrolling
    #[arg(long)]
    pub automation: bool,

    /// Directory holding automation tracks
    #[arg(long, default_value = ".telecue")]
    pub store: PathBuf,

    /// Drive a simulated background video through the sync adapter
    #[arg(long)]
    pub video: bool,

    /// Print every Nth frame
    #[arg(long, default_value_t = 30)]
    pub every: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    Json,
    Txt,
    Tsv,
    Srt,
    Vtt,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Txt => "txt",
            Format::Tsv => "tsv",
            Format::Srt => "srt",
            Format::Vtt => "vtt",
        }
    }
}
