//! Configuration
//!
//! Bridge settings loaded from layered sources: built-in defaults, a user
//! file, a project file, then `VTREE_BRIDGE_*` environment variables.

use crate::error::BridgeError;
use crate::filter::FilterRule;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod env;
    pub mod project_file;
    pub mod user_file;
}

pub use facade::ConfigLoader;

/// Pending queue length at which a warning is logged
pub const DEFAULT_QUEUE_WARN_AFTER: usize = 1000;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Renderer id stamped on every message until a host attaches
    #[serde(default = "default_renderer_id")]
    pub renderer_id: u32,

    /// Component filters active from the first commit
    #[serde(default)]
    pub filters: Vec<FilterRule>,

    #[serde(default)]
    pub profiling: ProfilingConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_renderer_id() -> u32 {
    1
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            renderer_id: default_renderer_id(),
            filters: Vec::new(),
            profiling: ProfilingConfig::default(),
            queue: QueueConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilingConfig {
    /// Start a profiling session as soon as a host attaches
    #[serde(default)]
    pub start_on_attach: bool,

    /// Collect changed prop/state keys per commit
    #[serde(default = "default_true")]
    pub record_change_descriptions: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            start_on_attach: false,
            record_change_descriptions: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue length that triggers a warning; commits are never dropped
    #[serde(default = "default_warn_after")]
    pub warn_after: usize,
}

fn default_warn_after() -> usize {
    DEFAULT_QUEUE_WARN_AFTER
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            warn_after: default_warn_after(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Renderer(String),
    Filter(usize, String),
    Queue(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Renderer(msg) => write!(f, "Renderer: {}", msg),
            ValidationError::Filter(index, msg) => write!(f, "Filter #{}: {}", index, msg),
            ValidationError::Queue(msg) => write!(f, "Queue: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl BridgeConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.renderer_id == 0 {
            errors.push(ValidationError::Renderer(
                "renderer_id 0 is reserved for \"no id\" on the wire".to_string(),
            ));
        }

        for (index, rule) in self.filters.iter().enumerate() {
            if let Err(e) = rule.validate() {
                errors.push(ValidationError::Filter(index, e));
            }
        }

        if self.queue.warn_after == 0 {
            errors.push(ValidationError::Queue(
                "warn_after must be at least 1".to_string(),
            ));
        }

        if let Err(e) = crate::logging::validate_format(&self.logging.format) {
            errors.push(ValidationError::Logging(e.to_string()));
        }
        if let Err(e) = crate::logging::validate_output(&self.logging.output) {
            errors.push(ValidationError::Logging(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every problem into one error.
    pub fn validated(self) -> Result<Self, BridgeError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            BridgeError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;
        Ok(self)
    }
}
