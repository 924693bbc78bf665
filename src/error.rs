//! Error types shared across the crate.

use thiserror::Error;

pub use crate::composio::ComposioError;
pub use crate::tools::ToolError;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Environment variable {key} is not valid unicode")]
    NotUnicode { key: String },
}
