//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Handset: run device automation step scripts against a mock or remote handset
#[derive(Parser, Debug)]
#[command(name = "handset")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the step phrases the registry understands
    List(ListArgs),

    /// Resolve every step of a script without touching a device
    Check(CheckArgs),

    /// Run a step script against a device
    Run(RunArgs),
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: ListFormat,
}

/// Output format for the list command
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// One step per line
    #[default]
    Text,
    /// JSON array of {name, pattern}
    Json,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Step script (one phrase per line, `Scenario:` headers, `#` comments)
    pub script: PathBuf,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Step script to run
    #[arg(required_unless_present = "step")]
    pub script: Option<PathBuf>,

    /// Inline step phrase (repeatable), run as one scenario after the script
    #[arg(short, long)]
    pub step: Vec<String>,

    /// Session config file (YAML)
    #[arg(short, long, env = "HANDSET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run against an in-memory mock device
    #[arg(long)]
    pub mock: bool,

    /// Report directory (overrides the config file)
    #[arg(short = 'o', long)]
    pub report_dir: Option<PathBuf>,

    /// Do not write reports
    #[arg(long)]
    pub no_report: bool,
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
