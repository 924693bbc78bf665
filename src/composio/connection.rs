//! Connected-account lifecycle: OAuth initiation, status polling, listing and
//! removal.
//!
//! The upstream is the source of truth for every account. Locally we keep an
//! advisory map of which account backs each service, which the execution
//! router reads when it calls an action.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::composio::client::ComposioClient;
use crate::composio::error::Result;
use crate::composio::integration::IntegrationResolver;
use crate::composio::types::{ConnectedAccount, ConnectionRequest, ConnectionStatus};

/// Advisory `service -> connected account id` map.
#[derive(Debug, Default)]
pub struct ActiveAccounts {
    by_service: RwLock<HashMap<String, String>>,
}

impl ActiveAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, service: &str) -> Option<String> {
        self.by_service
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .cloned()
    }

    pub fn bind(&self, service: &str, account_id: &str) {
        let previous = self
            .by_service
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(service.to_string(), account_id.to_string());
        if previous.as_deref() != Some(account_id) {
            tracing::debug!("Bound {} to connected account {}", service, account_id);
        }
    }

    /// Drop every binding that points at `account_id`, returning the services
    /// that were bound to it.
    pub fn forget_account(&self, account_id: &str) -> Vec<String> {
        let mut map = self
            .by_service
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let services: Vec<String> = map
            .iter()
            .filter(|(_, id)| id.as_str() == account_id)
            .map(|(service, _)| service.clone())
            .collect();
        for service in &services {
            map.remove(service);
        }
        services
    }

    /// Remove the binding for `service` only if it still points at `account_id`.
    pub fn forget_if(&self, service: &str, account_id: &str) -> bool {
        let mut map = self
            .by_service
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if map.get(service).map(String::as_str) == Some(account_id) {
            map.remove(service);
            true
        } else {
            false
        }
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.by_service
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Options for [`ConnectionManager::initiate`].
#[derive(Debug, Clone, Default)]
pub struct InitiateOptions {
    /// Skip resolution and use this integration id.
    pub integration_id: Option<String>,
    /// Where the upstream should send the user after authorizing.
    pub redirect_url: Option<String>,
    /// Entity to connect for; defaults to the bridge's configured entity.
    pub entity_id: Option<String>,
}

pub struct ConnectionManager {
    client: Arc<ComposioClient>,
    resolver: Arc<IntegrationResolver>,
    accounts: Arc<ActiveAccounts>,
    entity_id: String,
    /// Connections we started, so a later check knows their service even if
    /// the upstream omits it.
    pending: RwLock<HashMap<String, String>>,
}

impl ConnectionManager {
    pub fn new(
        client: Arc<ComposioClient>,
        resolver: Arc<IntegrationResolver>,
        accounts: Arc<ActiveAccounts>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            resolver,
            accounts,
            entity_id: entity_id.into(),
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Start an OAuth connection for `service`.
    ///
    /// Not retried: initiation creates upstream state and is not safe to
    /// repeat blindly.
    pub async fn initiate(
        &self,
        service: &str,
        options: InitiateOptions,
    ) -> Result<ConnectionRequest> {
        let result = self.try_initiate(service, options).await;
        match &result {
            Ok(request) => {
                tracing::info!(
                    "Initiated connection {} for {}",
                    request.connection_id,
                    service
                );
                self.pending
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(request.connection_id.clone(), service.to_string());
            }
            Err(e) => tracing::error!("Failed to initiate connection for {}: {}", service, e),
        }
        result
    }

    async fn try_initiate(
        &self,
        service: &str,
        options: InitiateOptions,
    ) -> Result<ConnectionRequest> {
        let integration_id = match options.integration_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => self.resolver.resolve(service).await?,
        };
        let entity_id = options
            .entity_id
            .unwrap_or_else(|| self.entity_id.clone());
        self.client
            .initiate_connection(&integration_id, &entity_id, options.redirect_url.as_deref())
            .await
    }

    /// Read the current status of a connection.
    ///
    /// Meant to be polled while the user completes OAuth, so failures come
    /// back as an `ERROR` record instead of an error.
    pub async fn check(&self, connection_id: &str) -> ConnectedAccount {
        match self.client.get_connection(connection_id).await {
            Ok(mut account) => {
                if account.service.is_empty()
                    && let Some(service) = self.pending_service(connection_id)
                {
                    account.service = service;
                }
                if account.status.is_active() && !account.service.is_empty() {
                    self.accounts.bind(&account.service, &account.id);
                    self.pending
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .remove(connection_id);
                }
                account
            }
            Err(e) => {
                tracing::error!("Failed to check connection {}: {}", connection_id, e);
                ConnectedAccount {
                    id: connection_id.to_string(),
                    service: self.pending_service(connection_id).unwrap_or_default(),
                    status: ConnectionStatus::Error,
                }
            }
        }
    }

    /// All connected accounts; empty when the upstream cannot be reached.
    pub async fn list(&self) -> Vec<ConnectedAccount> {
        self.client.list_connections().await.unwrap_or_else(|e| {
            tracing::error!("Failed to list connections: {}", e);
            Vec::new()
        })
    }

    /// Delete a connected account upstream. Returns whether it succeeded.
    pub async fn disconnect(&self, connection_id: &str) -> bool {
        match self.client.delete_connection(connection_id).await {
            Ok(()) => {
                let services = self.accounts.forget_account(connection_id);
                self.pending
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(connection_id);
                tracing::info!(
                    "Disconnected {} (was bound to {:?})",
                    connection_id,
                    services
                );
                true
            }
            Err(e) => {
                tracing::error!("Failed to disconnect {}: {}", connection_id, e);
                false
            }
        }
    }

    /// Bind `service` to the first active upstream account for it, unless a
    /// binding already exists. Returns the bound account id.
    pub async fn find_active(&self, service: &str) -> Option<String> {
        if let Some(id) = self.accounts.get(service) {
            return Some(id);
        }
        let account = self
            .list()
            .await
            .into_iter()
            .find(|a| a.status.is_active() && a.service.eq_ignore_ascii_case(service))?;
        self.accounts.bind(service, &account.id);
        Some(account.id)
    }

    pub fn accounts(&self) -> &Arc<ActiveAccounts> {
        &self.accounts
    }

    fn pending_service(&self, connection_id: &str) -> Option<String> {
        self.pending
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(connection_id)
            .cloned()
    }
}
