//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::BridgeError;

/// Map bridge errors to a string for CLI output.
pub fn map_error(e: &BridgeError) -> String {
    match e {
        BridgeError::Protocol(inner) => format!("Malformed message stream: {}", inner),
        other => other.to_string(),
    }
}
