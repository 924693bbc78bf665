//! Integration id resolution.
//!
//! Starting a connection needs the upstream integration id for a service,
//! while callers only know the service slug. The resolver looks one up,
//! creates one when none exists, and caches the answer for the lifetime of
//! the bridge.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::composio::client::ComposioClient;
use crate::composio::error::{ComposioError, Result};

pub struct IntegrationResolver {
    client: Arc<ComposioClient>,
    name_prefix: String,
    cache: RwLock<HashMap<String, String>>,
}

impl IntegrationResolver {
    pub fn new(client: Arc<ComposioClient>, name_prefix: impl Into<String>) -> Self {
        Self {
            client,
            name_prefix: name_prefix.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Cached integration id for a service, without touching the network.
    pub fn cached(&self, service: &str) -> Option<String> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .cloned()
    }

    /// Resolve the integration id for `service`, creating one if needed.
    ///
    /// Two concurrent calls for an uncached service may both hit the
    /// upstream; whichever finishes last overwrites the cache entry.
    pub async fn resolve(&self, service: &str) -> Result<String> {
        if let Some(id) = self.cached(service) {
            return Ok(id);
        }

        match self.client.list_integrations(service).await {
            Ok(ids) => {
                if let Some(id) = ids.into_iter().next() {
                    tracing::info!("Resolved integration for {}: {}", service, id);
                    self.remember(service, &id);
                    return Ok(id);
                }
            }
            Err(ComposioError::Closed) => return Err(ComposioError::Closed),
            Err(e) => {
                tracing::warn!("Failed to query integrations for {}: {}", service, e);
            }
        }

        let name = format!("{}-{}", self.name_prefix, service);
        match self.client.create_integration(service, &name).await {
            Ok(id) => {
                tracing::info!("Created integration for {}: {}", service, id);
                self.remember(service, &id);
                Ok(id)
            }
            Err(ComposioError::Closed) => Err(ComposioError::Closed),
            Err(e) => {
                tracing::error!("Failed to create integration for {}: {}", service, e);
                Err(ComposioError::IntegrationResolution {
                    service: service.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn remember(&self, service: &str, id: &str) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(service.to_string(), id.to_string());
    }
}
