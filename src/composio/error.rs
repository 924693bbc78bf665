//! Error types for the Composio bridge.

use thiserror::Error;

/// Result type for Composio operations.
pub type Result<T> = std::result::Result<T, ComposioError>;

/// Errors that can occur while talking to the Composio API.
#[derive(Debug, Error)]
pub enum ComposioError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        /// Endpoint label, e.g. `POST /v1/integrations`.
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    /// Neither lookup nor creation produced an integration id.
    #[error("Could not resolve integration ID for {service}: {reason}")]
    IntegrationResolution { service: String, reason: String },

    /// The bridge was closed.
    #[error("Composio bridge is closed")]
    Closed,

    /// The HTTP client could not be constructed.
    #[error("Failed to build Composio HTTP client: {0}")]
    ClientBuild(String),
}

impl ComposioError {
    /// HTTP status for upstream rejections, if this was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
