//! CLI front end: argument parsing and output rendering.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{ArgAction, Parser};

pub use commands::Commands;
pub use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "ski",
    version,
    about = "Install reusable skill packages into agent tool directories",
    long_about = "ski discovers skill packages in a library tree, installs them into \
                  per-agent directory conventions (claude, cursor, vscode, copilot, codex, \
                  goose, or a generic project layout), and tracks installed state in a \
                  per-agent manifest."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skill library root (overrides discovery)
    #[arg(long, global = true, value_name = "DIR", env = "SKI_LIBRARY")]
    pub library: Option<PathBuf>,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.robot {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}
