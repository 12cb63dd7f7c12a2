//! Merge rules: defaults first, later sources override earlier ones.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("renderer_id", 1_i64)?
        .set_default("profiling.start_on_attach", false)?
        .set_default("profiling.record_change_descriptions", true)?
        .set_default("queue.warn_after", crate::config::DEFAULT_QUEUE_WARN_AFTER as i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
