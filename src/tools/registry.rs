//! Live set of callable tools, keyed by name.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::tools::tool::{Tool, ToolError, ToolOutput, ToolSchema};

/// Registry of tools available to the agent.
///
/// Tools are inserted and removed at runtime; the registry is the single
/// execution entry point the agent calls by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    ///
    /// Returns the tool that was replaced, if any.
    pub async fn register(&self, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        let name = tool.name().to_string();
        let previous = self.tools.write().await.insert(name.clone(), tool);
        if previous.is_some() {
            tracing::warn!("Tool '{}' was already registered, replacing it", name);
        }
        previous
    }

    /// Remove a tool by name.
    pub async fn unregister(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.write().await.remove(name)
    }

    /// Look up a tool by name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().await.get(name).cloned()
    }

    /// Whether a tool with this name is registered.
    pub async fn has(&self, name: &str) -> bool {
        self.tools.read().await.contains_key(name)
    }

    /// Sorted names of all registered tools.
    pub async fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// All registered tools.
    pub async fn all(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.read().await.values().cloned().collect()
    }

    /// Number of registered tools.
    pub async fn count(&self) -> usize {
        self.tools.read().await.len()
    }

    /// Schemas for LLM function calling, sorted by name.
    pub async fn tool_definitions(&self) -> Vec<ToolSchema> {
        let mut defs: Vec<ToolSchema> = self
            .tools
            .read()
            .await
            .values()
            .map(|tool| tool.schema())
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool by name, enforcing its execution timeout.
    pub async fn execute(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .await
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let timeout = tool.execution_timeout();
        let start = Instant::now();
        let output = tokio::time::timeout(timeout, tool.execute(params))
            .await
            .map_err(|_| ToolError::Timeout(timeout))??;
        tracing::debug!("Tool '{}' finished in {:?}", name, start.elapsed());
        Ok(output)
    }
}
