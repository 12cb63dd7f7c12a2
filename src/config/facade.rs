//! Configuration loading facade

use super::merge::merge_policy;
use super::sources::{env, project_file, user_file};
use super::BridgeConfig;
use crate::error::BridgeError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`BridgeConfig`] from layered sources.
///
/// Precedence, lowest to highest: defaults, user file, project file (or an
/// explicit file), environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load with the project file under `project_root`.
    pub fn load(project_root: &Path) -> Result<BridgeConfig, BridgeError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = user_file::add_to_builder(builder);
        let builder = project_file::add_to_builder(builder, project_root);
        let builder = env::add_to_builder(builder);
        let config: BridgeConfig = builder.build()?.try_deserialize()?;
        debug!(
            project_root = %project_root.display(),
            filters = config.filters.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load from one explicit file, still honoring environment overrides.
    pub fn load_from_file(path: &Path) -> Result<BridgeConfig, BridgeError> {
        if !path.exists() {
            return Err(BridgeError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = env::add_to_builder(builder);
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Built-in defaults only.
    pub fn default() -> BridgeConfig {
        BridgeConfig::default()
    }

    pub fn user_config_path() -> Option<PathBuf> {
        user_file::user_config_path()
    }

    pub fn project_config_path(project_root: &Path) -> PathBuf {
        project_file::project_config_path(project_root)
    }
}
