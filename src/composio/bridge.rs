//! The long-lived bridge object handed to the rest of the application.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use crate::composio::client::ComposioClient;
use crate::composio::connection::{ActiveAccounts, ConnectionManager, InitiateOptions};
use crate::composio::error::Result;
use crate::composio::execute::ExecutionRouter;
use crate::composio::integration::IntegrationResolver;
use crate::composio::types::{
    ActionDescriptor, BridgeStatus, ConnectedAccount, ConnectionRequest, ServiceInfo,
};
use crate::composio::sync::ToolSynchronizer;
use crate::config::ComposioConfig;
use crate::tools::ToolRegistry;

/// Composio bridge: discovery, connection lifecycle, tool registration and
/// execution behind one handle.
///
/// Each instance owns its own caches, so independent bridges (one per test,
/// say) never see each other's state.
pub struct ComposioBridge {
    client: Arc<ComposioClient>,
    resolver: Arc<IntegrationResolver>,
    connections: Arc<ConnectionManager>,
    router: Arc<ExecutionRouter>,
    sync: ToolSynchronizer,
}

impl ComposioBridge {
    /// Build a bridge from configuration.
    pub fn new(config: &ComposioConfig) -> Result<Self> {
        let client = Arc::new(ComposioClient::new(config)?);
        let accounts = Arc::new(ActiveAccounts::new());
        let resolver = Arc::new(IntegrationResolver::new(
            Arc::clone(&client),
            config.integration_prefix.clone(),
        ));
        let connections = Arc::new(ConnectionManager::new(
            Arc::clone(&client),
            Arc::clone(&resolver),
            Arc::clone(&accounts),
            config.entity_id.clone(),
        ));
        let router = Arc::new(ExecutionRouter::new(
            Arc::clone(&client),
            Arc::clone(&accounts),
            config.entity_id.clone(),
        ));
        let sync = ToolSynchronizer::new(
            Arc::clone(&client),
            Arc::clone(&connections),
            Arc::clone(&router),
            config.timeout,
        );

        Ok(Self {
            client,
            resolver,
            connections,
            router,
            sync,
        })
    }

    // ── Discovery ───────────────────────────────────────────────────────

    /// Services offered by the marketplace; empty on failure.
    pub async fn list_services(&self) -> Vec<ServiceInfo> {
        self.client.list_apps().await.unwrap_or_else(|e| {
            tracing::error!("Failed to list Composio apps: {}", e);
            Vec::new()
        })
    }

    /// Actions offered by `service`, fetched fresh; empty on failure.
    pub async fn list_actions(&self, service: &str) -> Vec<ActionDescriptor> {
        self.client.list_actions(service).await.unwrap_or_else(|e| {
            tracing::error!("Failed to get actions for {}: {}", service, e);
            Vec::new()
        })
    }

    // ── Integrations & connections ──────────────────────────────────────

    pub async fn resolve_integration(&self, service: &str) -> Result<String> {
        self.resolver.resolve(service).await
    }

    pub async fn initiate_connection(
        &self,
        service: &str,
        options: InitiateOptions,
    ) -> Result<ConnectionRequest> {
        self.connections.initiate(service, options).await
    }

    pub async fn check_connection(&self, connection_id: &str) -> ConnectedAccount {
        self.connections.check(connection_id).await
    }

    pub async fn list_connections(&self) -> Vec<ConnectedAccount> {
        self.connections.list().await
    }

    pub async fn disconnect(&self, connection_id: &str) -> bool {
        self.connections.disconnect(connection_id).await
    }

    /// Disconnect an account and drop the tools of every service it backed.
    pub async fn disconnect_and_unregister(
        &self,
        connection_id: &str,
        registry: &ToolRegistry,
    ) -> bool {
        let services: Vec<String> = self
            .connections
            .accounts()
            .snapshot()
            .into_iter()
            .filter(|(_, id)| id == connection_id)
            .map(|(service, _)| service)
            .collect();

        if !self.connections.disconnect(connection_id).await {
            return false;
        }
        for service in &services {
            self.sync.unregister_all(service, registry).await;
        }
        true
    }

    /// Explicitly bind `service` to a connected account.
    pub fn bind_account(&self, service: &str, connection_id: &str) {
        self.connections.accounts().bind(service, connection_id);
    }

    /// Bind `service` to its first active upstream account unless already
    /// bound. Returns the bound account id.
    pub async fn find_active(&self, service: &str) -> Option<String> {
        self.connections.find_active(service).await
    }

    /// The account currently bound to `service`, if any.
    pub fn active_account(&self, service: &str) -> Option<String> {
        self.connections.accounts().get(service)
    }

    // ── Tool registration ───────────────────────────────────────────────

    pub async fn register_all(&self, service: &str, registry: &ToolRegistry) -> usize {
        self.sync.register_all(service, registry).await
    }

    pub async fn register_selected(
        &self,
        service: &str,
        selected: &[String],
        registry: &ToolRegistry,
    ) -> usize {
        self.sync.register_selected(service, selected, registry).await
    }

    pub async fn unregister_all(&self, service: &str, registry: &ToolRegistry) {
        self.sync.unregister_all(service, registry).await
    }

    pub fn registered_tools(&self) -> HashMap<String, Vec<String>> {
        self.sync.registered_tools()
    }

    pub fn registered_count(&self) -> usize {
        self.sync.registered_count()
    }

    /// Startup reconciliation: bind every active account and register tools
    /// for its service. Services with an entry in `selections` only get the
    /// selected actions. Returns the number of tools registered.
    pub async fn reconcile(
        &self,
        registry: &ToolRegistry,
        selections: &HashMap<String, Vec<String>>,
    ) -> usize {
        let mut services: Vec<String> = Vec::new();
        for account in self.connections.list().await {
            if !account.status.is_active() || account.service.is_empty() {
                continue;
            }
            if !services.contains(&account.service) {
                self.bind_account(&account.service, &account.id);
                services.push(account.service);
            }
        }

        let counts = join_all(services.iter().map(|service| async move {
            match selections.get(service) {
                Some(selected) => self.register_selected(service, selected, registry).await,
                None => self.register_all(service, registry).await,
            }
        }))
        .await;

        let total: usize = counts.iter().sum();
        tracing::info!(
            "Composio: reconciled {} active services, {} tools",
            services.len(),
            total
        );
        total
    }

    // ── Execution ───────────────────────────────────────────────────────

    /// Execute an action directly, bypassing the registry.
    pub async fn execute(&self, action: &str, arguments: Value, service: &str) -> String {
        self.router.execute(action, arguments, service).await
    }

    // ── Status & shutdown ───────────────────────────────────────────────

    /// Connection summary for health/status surfaces.
    pub async fn status(&self) -> BridgeStatus {
        match self.client.list_connections().await {
            Ok(accounts) => BridgeStatus::from_accounts(&accounts),
            Err(e) => {
                tracing::warn!("Composio status check failed: {}", e);
                BridgeStatus::unreachable()
            }
        }
    }

    /// Release the HTTP connection pool. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        let closed = self.client.close();
        if closed {
            tracing::debug!("Composio bridge closed");
        }
        closed
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}
