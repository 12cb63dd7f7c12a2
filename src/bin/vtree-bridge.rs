//! vtree-bridge CLI Binary
//!
//! Drives the bridge from scenario files and decodes recorded message streams.

use anyhow::Context;
use clap::Parser;
use std::process;
use tracing::{error, info};
use vtree_bridge::cli::{map_error, Cli, RunContext};
use vtree_bridge::config::ConfigLoader;
use vtree_bridge::logging::{init_logging, LoggingConfig};

fn main() {
    if let Err(e) = run() {
        eprintln!("{:#}", e);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if logging_config.enabled {
        init_logging(Some(&logging_config)).context("Failed to initialize logging")?;
    }
    info!("vtree-bridge starting");

    let context = RunContext::new(cli.project.clone(), cli.config.clone())
        .map_err(|e| anyhow::anyhow!(map_error(&e)))
        .context("Failed to load configuration")?;

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            Err(anyhow::anyhow!(map_error(&e)))
        }
    }
}

/// Build logging configuration from CLI args and the config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path)
            .map(|c| c.logging)
            .unwrap_or_default(),
        None => ConfigLoader::load(&cli.project)
            .map(|c| c.logging)
            .unwrap_or_default(),
    };

    if cli.verbose {
        config.enabled = true;
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.enabled = true;
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }
    if cli.quiet {
        config.enabled = false;
    }
    config
}
