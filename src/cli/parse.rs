//! CLI parse: clap types for vtree-bridge. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Drive the inspector bridge from recorded scenarios and inspect its output
#[derive(Parser, Debug)]
#[command(name = "vtree-bridge")]
#[command(about = "Commit-processing bridge between a component-tree runtime and an inspector")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory searched for vtree-bridge.toml
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a JSON scenario through the bridge and print the emitted messages
    Replay {
        /// Scenario file
        scenario: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Also decode the messages and print the inspector's reconstructed tree
        #[arg(long)]
        decode: bool,
        /// Print the profiling data collected during the run
        #[arg(long)]
        profile: bool,
    },
    /// Decode a JSON array of messages and print the reconstructed tree
    Decode {
        /// File holding `[[u32, ...], ...]`
        messages: PathBuf,
    },
    /// Show the effective configuration and validate it
    Config {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
