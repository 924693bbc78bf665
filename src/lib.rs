//! Composio bridge: exposes third-party SaaS actions as agent tools and
//! manages the connected accounts behind them.

pub mod cli;
pub mod composio;
pub mod config;
pub mod error;
pub mod tools;
