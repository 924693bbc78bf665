//! Keeps the tool registry in step with connected services.
//!
//! Every tool this module inserts is tracked under its service, and tools are
//! only ever removed a whole service at a time, so the registry never holds a
//! Composio tool the tracker does not know about (and vice versa).
//!
//! Services are tracked under their slug, the same form that appears in tool
//! names, so `Gmail` and `gmail` share one entry.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::composio::client::ComposioClient;
use crate::composio::connection::ConnectionManager;
use crate::composio::execute::ExecutionRouter;
use crate::composio::naming::slug;
use crate::composio::types::ActionDescriptor;
use crate::composio::wrapper::ComposioTool;
use crate::tools::{Tool, ToolRegistry, validate_tool_schema};

pub struct ToolSynchronizer {
    client: Arc<ComposioClient>,
    connections: Arc<ConnectionManager>,
    router: Arc<ExecutionRouter>,
    tool_timeout: Duration,
    registered: RwLock<HashMap<String, Vec<String>>>,
    /// Held across every registry mutation so replaces never interleave.
    mutation: Mutex<()>,
}

impl ToolSynchronizer {
    pub fn new(
        client: Arc<ComposioClient>,
        connections: Arc<ConnectionManager>,
        router: Arc<ExecutionRouter>,
        tool_timeout: Duration,
    ) -> Self {
        Self {
            client,
            connections,
            router,
            tool_timeout,
            registered: RwLock::new(HashMap::new()),
            mutation: Mutex::new(()),
        }
    }

    /// Discover every action for `service` and register each as a tool.
    ///
    /// Returns the number of tools registered.
    pub async fn register_all(&self, service: &str, registry: &ToolRegistry) -> usize {
        let actions = self.discover(service).await;
        let count = self.install(service, actions, registry).await;
        tracing::info!("Composio: registered {} tools for {}", count, service);
        count
    }

    /// Like [`register_all`](Self::register_all), restricted to the named
    /// actions. Names the upstream does not list are skipped.
    pub async fn register_selected(
        &self,
        service: &str,
        selected: &[String],
        registry: &ToolRegistry,
    ) -> usize {
        let wanted: HashSet<&str> = selected.iter().map(String::as_str).collect();
        let actions: Vec<ActionDescriptor> = self
            .discover(service)
            .await
            .into_iter()
            .filter(|a| wanted.contains(a.name.as_str()))
            .collect();
        let count = self.install(service, actions, registry).await;
        tracing::info!(
            "Composio: registered {}/{} selected tools for {}",
            count,
            wanted.len(),
            service
        );
        count
    }

    /// Remove every tool previously registered for `service`.
    pub async fn unregister_all(&self, service: &str, registry: &ToolRegistry) {
        let _guard = self.mutation.lock().await;
        self.remove_tracked(&slug(service), registry).await;
    }

    /// Tracked tool names, by service.
    pub fn registered_tools(&self) -> HashMap<String, Vec<String>> {
        self.registered
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Total number of tracked tools.
    pub fn registered_count(&self) -> usize {
        self.registered
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    async fn discover(&self, service: &str) -> Vec<ActionDescriptor> {
        match self.client.list_actions(service).await {
            Ok(actions) => actions,
            Err(e) => {
                tracing::error!("Failed to get actions for {}: {}", service, e);
                Vec::new()
            }
        }
    }

    async fn remove_tracked(&self, key: &str, registry: &ToolRegistry) {
        let names = self
            .registered
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_default();
        for name in &names {
            registry.unregister(name).await;
        }
        // Untrack only once the registry is clear of them.
        self.registered
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        if !names.is_empty() {
            tracing::info!("Composio: unregistered {} tools for {}", names.len(), key);
        }
    }

    fn track(&self, key: &str, name: String) {
        self.registered
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .push(name);
    }

    async fn install(
        &self,
        service: &str,
        actions: Vec<ActionDescriptor>,
        registry: &ToolRegistry,
    ) -> usize {
        let _guard = self.mutation.lock().await;
        let key = slug(service);

        // Replace rather than append, so a shrinking action set leaves nothing behind.
        self.remove_tracked(&key, registry).await;

        if self.connections.find_active(service).await.is_none() {
            tracing::debug!("No active account bound for {}", service);
        }

        let mut names: HashSet<String> = HashSet::with_capacity(actions.len());
        for action in actions {
            if action.name.trim().is_empty() {
                tracing::debug!("Skipping unnamed action for {}", service);
                continue;
            }
            let tool = ComposioTool::new(
                Arc::clone(&self.router),
                service,
                action,
                self.tool_timeout,
            );
            let name = tool.name().to_string();
            if names.contains(&name) {
                continue;
            }

            let problems = validate_tool_schema(&tool.parameters_schema(), &name);
            if !problems.is_empty() {
                tracing::warn!(
                    "Composio: schema issues for '{}': {}",
                    name,
                    problems.join("; ")
                );
            }

            tracing::debug!(
                "Composio: registering '{}' for {}:{}",
                name,
                tool.service(),
                tool.action()
            );
            // Track before the await so a dropped future cannot leave an untracked tool.
            self.track(&key, name.clone());
            registry.register(Arc::new(tool)).await;
            names.insert(name);
        }

        names.len()
    }
}
