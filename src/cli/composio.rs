//! Composio CLI commands.

use std::time::Duration;

use anyhow::Context;

use crate::cli::Command;
use crate::composio::naming::{belongs_to_service, tool_name};
use crate::composio::{ComposioBridge, ConnectionStatus, InitiateOptions};
use crate::config::ComposioConfig;
use crate::tools::ToolRegistry;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Run a CLI command against the configured upstream.
pub async fn run_composio_command(cmd: Command, config: &ComposioConfig) -> anyhow::Result<()> {
    let bridge = ComposioBridge::new(config).context("failed to build Composio client")?;

    let result = match cmd {
        Command::Apps => cmd_apps(&bridge).await,
        Command::Actions { service, verbose } => cmd_actions(&bridge, &service, verbose).await,
        Command::Connect {
            service,
            redirect_url,
            entity,
            integration_id,
            no_browser,
            wait_secs,
        } => {
            let options = InitiateOptions {
                integration_id,
                redirect_url,
                entity_id: entity,
            };
            cmd_connect(&bridge, &service, options, no_browser, wait_secs).await
        }
        Command::Check { connection_id } => cmd_check(&bridge, &connection_id).await,
        Command::Connections => cmd_connections(&bridge).await,
        Command::Disconnect { connection_id } => cmd_disconnect(&bridge, &connection_id).await,
        Command::Status => cmd_status(&bridge).await,
        Command::Tools { service, actions } => cmd_tools(&bridge, &service, &actions).await,
        Command::Exec {
            service,
            action,
            args,
        } => cmd_exec(&bridge, &service, &action, args.as_deref()).await,
        Command::ToolName { service, action } => {
            println!("{}", tool_name(&service, &action));
            Ok(())
        }
    };

    bridge.close();
    result
}

async fn cmd_apps(bridge: &ComposioBridge) -> anyhow::Result<()> {
    let services = bridge.list_services().await;
    if services.is_empty() {
        println!("No services found.");
        return Ok(());
    }

    println!("{:<24}  {:<28}  CATEGORIES", "NAME", "DISPLAY NAME");
    for service in &services {
        println!(
            "{:<24}  {:<28}  {}",
            service.name,
            service.display_name,
            service.categories.join(", ")
        );
    }
    println!();
    println!("{} services", services.len());
    Ok(())
}

async fn cmd_actions(bridge: &ComposioBridge, service: &str, verbose: bool) -> anyhow::Result<()> {
    let actions = bridge.list_actions(service).await;
    if actions.is_empty() {
        println!("No actions found for '{}'.", service);
        return Ok(());
    }

    for action in &actions {
        println!("{}", action.name);
        println!("  tool: {}", tool_name(service, &action.name));
        if !action.description.is_empty() {
            println!("  {}", action.description);
        }
        if verbose {
            let schema = serde_json::to_string_pretty(&action.parameters)?;
            for line in schema.lines() {
                println!("    {}", line);
            }
        }
    }
    println!();
    println!("{} actions", actions.len());
    Ok(())
}

async fn cmd_connect(
    bridge: &ComposioBridge,
    service: &str,
    options: InitiateOptions,
    no_browser: bool,
    wait_secs: u64,
) -> anyhow::Result<()> {
    let request = bridge
        .initiate_connection(service, options)
        .await
        .with_context(|| format!("failed to start a connection for '{}'", service))?;

    println!("Connection id: {}", request.connection_id);
    println!("Authorize at:  {}", request.url);

    if !no_browser
        && !request.url.is_empty()
        && let Err(e) = open::that(&request.url)
    {
        tracing::warn!("Could not open a browser: {}", e);
    }

    if wait_secs == 0 {
        return Ok(());
    }

    println!("Waiting for authorization...");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(wait_secs);
    loop {
        let account = bridge.check_connection(&request.connection_id).await;
        match account.status {
            ConnectionStatus::Active => {
                println!("Connected {} ({}).", service, account.id);
                return Ok(());
            }
            ConnectionStatus::Failed => {
                anyhow::bail!("Connection {} failed", request.connection_id)
            }
            _ => {}
        }
        if tokio::time::Instant::now() + POLL_INTERVAL > deadline {
            println!(
                "Still {}. Run 'composio-bridge check {}' once authorized.",
                account.status, request.connection_id
            );
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn cmd_check(bridge: &ComposioBridge, connection_id: &str) -> anyhow::Result<()> {
    let account = bridge.check_connection(connection_id).await;
    let service = if account.service.is_empty() {
        "-"
    } else {
        account.service.as_str()
    };
    println!("{}  {}  {}", account.id, service, account.status);
    Ok(())
}

async fn cmd_connections(bridge: &ComposioBridge) -> anyhow::Result<()> {
    let accounts = bridge.list_connections().await;
    if accounts.is_empty() {
        println!("No connected accounts.");
        return Ok(());
    }

    println!("{:<40}  {:<20}  STATUS", "ID", "SERVICE");
    for account in &accounts {
        println!(
            "{:<40}  {:<20}  {}",
            account.id, account.service, account.status
        );
    }
    Ok(())
}

async fn cmd_disconnect(bridge: &ComposioBridge, connection_id: &str) -> anyhow::Result<()> {
    if !bridge.disconnect(connection_id).await {
        anyhow::bail!("Failed to disconnect {}", connection_id);
    }
    println!("Disconnected {}.", connection_id);
    Ok(())
}

async fn cmd_status(bridge: &ComposioBridge) -> anyhow::Result<()> {
    let status = bridge.status().await;
    println!(
        "Upstream:    {}",
        if status.connected {
            "reachable"
        } else {
            "unreachable"
        }
    );
    println!(
        "Connections: {} active / {} total",
        status.active_connections, status.total_connections
    );
    if !status.services.is_empty() {
        println!("Services:    {}", status.services.join(", "));
    }
    Ok(())
}

async fn cmd_tools(
    bridge: &ComposioBridge,
    service: &str,
    actions: &[String],
) -> anyhow::Result<()> {
    let registry = ToolRegistry::new();
    let count = if actions.is_empty() {
        bridge.register_all(service, &registry).await
    } else {
        bridge.register_selected(service, actions, &registry).await
    };

    let definitions: Vec<_> = registry
        .tool_definitions()
        .await
        .into_iter()
        .filter(|def| belongs_to_service(&def.name, service))
        .collect();
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    eprintln!("{} tools registered for {}", count, service);
    Ok(())
}

async fn cmd_exec(
    bridge: &ComposioBridge,
    service: &str,
    action: &str,
    args: Option<&str>,
) -> anyhow::Result<()> {
    let arguments = match args {
        Some(raw) => {
            let value: serde_json::Value =
                serde_json::from_str(raw).context("--args must be valid JSON")?;
            if !value.is_object() {
                anyhow::bail!("--args must be a JSON object");
            }
            value
        }
        None => serde_json::json!({}),
    };

    if bridge.find_active(service).await.is_none() {
        tracing::warn!("No active {} account; executing without one", service);
    }

    println!("{}", bridge.execute(action, arguments, service).await);
    Ok(())
}
