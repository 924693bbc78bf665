//! CLI command handling.
//!
//! Provides subcommands for:
//! - Browsing the marketplace (`apps`, `actions`)
//! - Managing connected accounts (`connect`, `check`, `connections`, `disconnect`)
//! - Checking bridge health (`status`)
//! - Previewing and calling tools (`tools`, `exec`, `tool-name`)

mod composio;

pub use composio::run_composio_command;

use clap::{ColorChoice, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "composio-bridge")]
#[command(about = "Expose Composio marketplace actions as agent tools")]
#[command(
    long_about = "Bridge to the Composio action marketplace. Use 'composio-bridge <subcommand> --help' for details.\nExamples:\n  composio-bridge apps  # List services\n  composio-bridge connect gmail  # Start OAuth for Gmail"
)]
#[command(version)]
#[command(color = ColorChoice::Auto)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List services offered by the marketplace
    #[command(
        about = "List available services",
        long_about = "Lists every service the marketplace offers.\nExample: composio-bridge apps"
    )]
    Apps,

    /// List the actions of one service
    #[command(
        about = "List actions for a service",
        long_about = "Lists the actions a service exposes, with their tool names.\nExample: composio-bridge actions gmail"
    )]
    Actions {
        /// Service slug (e.g. "gmail", "slack")
        service: String,

        /// Print each action's parameter schema
        #[arg(short, long)]
        verbose: bool,
    },

    /// Connect an account to a service via OAuth
    #[command(
        about = "Connect a service account",
        long_about = "Starts an OAuth flow, opens the authorization URL and waits for it to complete.\nExample: composio-bridge connect gmail --wait-secs 300"
    )]
    Connect {
        /// Service slug
        service: String,

        /// Where to send the user after authorizing
        #[arg(long)]
        redirect_url: Option<String>,

        /// Entity to connect for (defaults to COMPOSIO_ENTITY_ID)
        #[arg(long)]
        entity: Option<String>,

        /// Use this integration id instead of resolving one
        #[arg(long)]
        integration_id: Option<String>,

        /// Print the URL without opening a browser
        #[arg(long)]
        no_browser: bool,

        /// Seconds to wait for the connection to become active (0 = don't wait)
        #[arg(long, default_value = "120")]
        wait_secs: u64,
    },

    /// Show the status of a connection
    #[command(
        about = "Check a connection",
        long_about = "Reads the current status of a connected account.\nExample: composio-bridge check ca_123"
    )]
    Check {
        /// Connected account id
        connection_id: String,
    },

    /// List connected accounts
    #[command(
        about = "List connections",
        long_about = "Lists every connected account and its status.\nExample: composio-bridge connections"
    )]
    Connections,

    /// Delete a connected account
    #[command(
        about = "Disconnect an account",
        long_about = "Deletes a connected account upstream.\nExample: composio-bridge disconnect ca_123"
    )]
    Disconnect {
        /// Connected account id
        connection_id: String,
    },

    /// Show bridge health
    #[command(
        about = "Show bridge status",
        long_about = "Summarizes upstream reachability and active connections.\nExample: composio-bridge status"
    )]
    Status,

    /// Register a service's actions and print the resulting tool definitions
    #[command(
        about = "Preview tool definitions",
        long_about = "Registers a service's actions into a scratch registry and prints the tool definitions an agent would see.\nExample: composio-bridge tools gmail --action GMAIL_SEND_EMAIL"
    )]
    Tools {
        /// Service slug
        service: String,

        /// Only register these actions (repeatable)
        #[arg(short, long = "action")]
        actions: Vec<String>,
    },

    /// Execute one action
    #[command(
        about = "Execute an action",
        long_about = "Runs an action with the service's active account.\nExample: composio-bridge exec gmail GMAIL_SEND_EMAIL --args '{\"to\":\"a@b.c\"}'"
    )]
    Exec {
        /// Service slug
        service: String,

        /// Upstream action name
        action: String,

        /// Arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },

    /// Print the tool name an action would be registered under
    #[command(
        about = "Compute a tool name",
        long_about = "Prints the tool name for a service and action. Works offline.\nExample: composio-bridge tool-name gmail GMAIL_SEND_EMAIL"
    )]
    ToolName {
        /// Service slug
        service: String,

        /// Upstream action name
        action: String,
    },
}
