use std::time::Duration;

use secrecy::SecretString;

use crate::config::helpers::{optional_env, parse_optional};
use crate::error::ConfigError;

/// Default upstream API root.
pub const DEFAULT_BASE_URL: &str = "https://backend.composio.dev/api";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Entity marker sent with connection and execution requests.
pub const DEFAULT_ENTITY_ID: &str = "default";
/// Prefix for integrations the bridge creates on demand.
pub const DEFAULT_INTEGRATION_PREFIX: &str = "liv";

/// Composio marketplace configuration.
#[derive(Clone)]
pub struct ComposioConfig {
    /// API key sent as `x-api-key` on every request.
    pub api_key: SecretString,
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout for upstream calls.
    pub timeout: Duration,
    /// Entity marker for connections and executions.
    pub entity_id: String,
    /// Name prefix for integrations created by the resolver.
    pub integration_prefix: String,
}

impl std::fmt::Debug for ComposioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposioConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("entity_id", &self.entity_id)
            .field("integration_prefix", &self.integration_prefix)
            .finish()
    }
}

impl ComposioConfig {
    /// Build a config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            entity_id: DEFAULT_ENTITY_ID.to_string(),
            integration_prefix: DEFAULT_INTEGRATION_PREFIX.to_string(),
        }
    }

    /// Point the bridge at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve from the process environment.
    ///
    /// Returns `Ok(None)` when no API key is set.
    pub(crate) fn resolve() -> Result<Option<Self>, ConfigError> {
        Self::resolve_with(optional_env)
    }

    fn resolve_with<F>(lookup: F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Result<Option<String>, ConfigError>,
    {
        let api_key = match lookup("COMPOSIO_API_KEY")? {
            Some(key) => key,
            None => match lookup("LIV_COMPOSIO_API_KEY")? {
                Some(key) => key,
                None => return Ok(None),
            },
        };

        let base_url = lookup("COMPOSIO_BASE_URL")?
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let parsed = url::Url::parse(&base_url).map_err(|e| ConfigError::InvalidValue {
            key: "COMPOSIO_BASE_URL".to_string(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: "COMPOSIO_BASE_URL".to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let timeout_secs = parse_optional(
            "COMPOSIO_TIMEOUT_SECS",
            lookup("COMPOSIO_TIMEOUT_SECS")?,
            DEFAULT_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "COMPOSIO_TIMEOUT_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let mut config = Self::new(api_key)
            .with_base_url(base_url)
            .with_timeout(Duration::from_secs(timeout_secs));
        if let Some(entity) = lookup("COMPOSIO_ENTITY_ID")? {
            config.entity_id = entity;
        }
        if let Some(prefix) = lookup("COMPOSIO_INTEGRATION_PREFIX")? {
            config.integration_prefix = prefix;
        }

        Ok(Some(config))
    }
}
