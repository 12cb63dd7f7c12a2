//! CLI route: single route table and run context.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_config, format_events, format_profiling, format_replayed_tree};
use crate::cli::scenario::{run_scenario, Scenario};
use crate::config::{BridgeConfig, ConfigLoader};
use crate::error::BridgeError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Runtime context for CLI execution: the effective configuration.
pub struct RunContext {
    config: BridgeConfig,
    config_source: String,
}

impl RunContext {
    /// Load configuration from `config_path` if given, else from `project_root`.
    pub fn new(project_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, BridgeError> {
        let (config, config_source) = match config_path {
            Some(path) => (
                ConfigLoader::load_from_file(&path)?,
                path.display().to_string(),
            ),
            None => (
                ConfigLoader::load(&project_root)?,
                ConfigLoader::project_config_path(&project_root)
                    .display()
                    .to_string(),
            ),
        };
        Ok(Self {
            config,
            config_source,
        })
    }

    /// Context over an already built configuration.
    pub fn with_config(config: BridgeConfig) -> Self {
        Self {
            config,
            config_source: "<memory>".to_string(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, BridgeError> {
        match command {
            Commands::Replay {
                scenario,
                format,
                decode,
                profile,
            } => self.replay(scenario, *format, *decode, *profile),
            Commands::Decode { messages } => {
                let messages: Vec<Vec<u32>> = read_json(messages)?;
                format_replayed_tree(&messages)
            }
            Commands::Config { format } => {
                let problems: Vec<String> = match self.config.validate() {
                    Ok(()) => Vec::new(),
                    Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
                };
                info!(source = %self.config_source, "Showing configuration");
                format_config(&self.config, &problems, *format)
            }
        }
    }

    fn replay(
        &self,
        path: &Path,
        format: OutputFormat,
        decode: bool,
        profile: bool,
    ) -> Result<String, BridgeError> {
        let config = self.config.clone().validated()?;
        let scenario: Scenario = read_json(path)?;
        let report = run_scenario(&scenario, &config)?;
        info!(
            steps = scenario.steps.len(),
            events = report.events.len(),
            pending = report.pending,
            "Scenario replayed"
        );

        let mut out = format_events(&report.events, format)?;
        if decode {
            out.push('\n');
            out.push_str(&format_replayed_tree(&report.messages())?);
        }
        if profile {
            out.push('\n');
            out.push_str(&format_profiling(&report.profiling, format)?);
        }
        if report.pending > 0 && format != OutputFormat::Json {
            out.push_str(&format!(
                "\n{} message(s) still queued; the scenario never connected\n",
                report.pending
            ));
        }
        Ok(out)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, BridgeError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        BridgeError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
    })
}
