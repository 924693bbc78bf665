//! Composio bridge - command-line entry point.

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use composio_bridge::{
    cli::{Cli, Command, run_composio_command},
    composio::tool_name,
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Offline commands don't need configuration or logging.
    if let Command::ToolName { service, action } = &cli.command {
        println!("{}", tool_name(service, action));
        return Ok(());
    }

    // Load .env if present
    let _ = dotenvy::dotenv();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("composio_bridge=info"));
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    let config = Config::from_env()?;
    let Some(composio) = config.composio else {
        anyhow::bail!(
            "Composio is not configured. Set COMPOSIO_API_KEY (or LIV_COMPOSIO_API_KEY) \
             in the environment or a .env file."
        );
    };

    tracing::debug!("Using Composio at {}", composio.base_url);
    run_composio_command(cli.command, &composio).await
}
