//! Configuration for the bridge.
//!
//! Settings are read from environment variables (optionally seeded from a
//! `.env` file by the binary). A missing API key is not an error: it resolves
//! to "not configured" so callers can tell it apart from a broken setup.

mod composio;
pub(crate) mod helpers;

pub use composio::{
    ComposioConfig, DEFAULT_BASE_URL, DEFAULT_ENTITY_ID, DEFAULT_INTEGRATION_PREFIX,
    DEFAULT_TIMEOUT_SECS,
};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Composio settings, `None` when no API key is configured.
    pub composio: Option<ComposioConfig>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            composio: ComposioConfig::resolve()?,
        })
    }
}
