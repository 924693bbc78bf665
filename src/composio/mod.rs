//! Composio action bridge.
//!
//! Discovers actions from the Composio marketplace, exposes each one as a
//! [`Tool`](crate::tools::Tool), manages the OAuth connections behind them and
//! keeps the [`ToolRegistry`](crate::tools::ToolRegistry) in step with which
//! accounts are connected.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                             ComposioBridge                               │
//! │                                                                          │
//! │  list_actions()        register_all()          tool.execute()            │
//! │        │                      │                       │                  │
//! │        ▼                      ▼                       ▼                  │
//! │  ┌────────────┐      ┌─────────────────┐     ┌─────────────────┐        │
//! │  │ Discovery  │─────▶│ToolSynchronizer │────▶│ ExecutionRouter │        │
//! │  └────────────┘      │ (tool_name +    │     │ (active account │        │
//! │                      │  ComposioTool)  │     │  + normalize)   │        │
//! │                      └─────────────────┘     └─────────────────┘        │
//! │                              ▲                       ▲                  │
//! │  initiate() / check()        │ find_active()         │ ActiveAccounts   │
//! │        │              ┌──────┴──────────┐            │                  │
//! │        └─────────────▶│ConnectionManager│────────────┘                  │
//! │                       └──────┬──────────┘                               │
//! │                              ▼                                          │
//! │                     ┌─────────────────────┐                             │
//! │                     │ IntegrationResolver │                             │
//! │                     └─────────────────────┘                             │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use composio_bridge::composio::{ComposioBridge, InitiateOptions};
//! use composio_bridge::config::ComposioConfig;
//! use composio_bridge::tools::ToolRegistry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bridge = Arc::new(ComposioBridge::new(&ComposioConfig::new("api-key"))?);
//! let registry = ToolRegistry::new();
//!
//! let request = bridge
//!     .initiate_connection("gmail", InitiateOptions::default())
//!     .await?;
//! println!("Authorize at {}", request.url);
//!
//! // ... once check_connection() reports ACTIVE:
//! bridge.register_all("gmail", &registry).await;
//!
//! bridge.close();
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod client;
pub mod connection;
pub mod error;
pub mod execute;
pub mod integration;
pub mod naming;
pub mod sync;
pub mod types;
pub mod wrapper;

pub use bridge::ComposioBridge;
pub use connection::{ActiveAccounts, InitiateOptions};
pub use error::{ComposioError, Result};
pub use naming::tool_name;
pub use types::{
    ActionDescriptor, BridgeStatus, ConnectedAccount, ConnectionRequest, ConnectionStatus,
    ServiceInfo,
};
pub use wrapper::ComposioTool;
