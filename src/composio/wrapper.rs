//! Adapter exposing one Composio action as a [`Tool`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::composio::execute::ExecutionRouter;
use crate::composio::naming::tool_name;
use crate::composio::types::ActionDescriptor;
use crate::tools::{Tool, ToolError, ToolOutput};

/// A discovered action, callable by the agent under a synthesized name.
///
/// Holds no logic of its own: arguments go straight to the execution router
/// together with the service and action captured at construction.
pub struct ComposioTool {
    router: Arc<ExecutionRouter>,
    service: String,
    action: String,
    name: String,
    description: String,
    parameters: serde_json::Value,
    timeout: Duration,
}

impl ComposioTool {
    pub fn new(
        router: Arc<ExecutionRouter>,
        service: &str,
        action: ActionDescriptor,
        timeout: Duration,
    ) -> Self {
        let description = if action.description.trim().is_empty() {
            action.name.clone()
        } else {
            action.description
        };
        Self {
            router,
            service: service.to_string(),
            name: tool_name(service, &action.name),
            action: action.name,
            description,
            parameters: action.parameters,
            timeout,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl std::fmt::Debug for ComposioTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposioTool")
            .field("name", &self.name)
            .field("service", &self.service)
            .field("action", &self.action)
            .finish()
    }
}

#[async_trait]
impl Tool for ComposioTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.parameters.clone()
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let arguments = match params {
            serde_json::Value::Null => serde_json::json!({}),
            obj @ serde_json::Value::Object(_) => obj,
            other => {
                return Err(ToolError::InvalidParameters(format!(
                    "expected an object of arguments, got {other}"
                )));
            }
        };

        let start = Instant::now();
        let text = self
            .router
            .execute(&self.action, arguments, &self.service)
            .await;
        Ok(ToolOutput::text(text, start.elapsed()))
    }

    fn execution_timeout(&self) -> Duration {
        // Leave room for the re-check that may follow a failed request.
        self.timeout
            .saturating_mul(2)
            .saturating_add(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::composio::client::ComposioClient;
    use crate::composio::connection::ActiveAccounts;
    use crate::config::ComposioConfig;

    fn tool_with_timeout(timeout: Duration) -> ComposioTool {
        let client = Arc::new(ComposioClient::new(&ComposioConfig::new("key")).unwrap());
        let router = Arc::new(ExecutionRouter::new(
            client,
            Arc::new(ActiveAccounts::new()),
            "default",
        ));
        let action = ActionDescriptor {
            name: "GMAIL_SEND_EMAIL".to_string(),
            display_name: "Send email".to_string(),
            description: String::new(),
            parameters: json!({"type": "object", "properties": {}}),
        };
        ComposioTool::new(router, "gmail", action, timeout)
    }

    #[test]
    fn test_execution_timeout_leaves_room_for_recheck() {
        let tool = tool_with_timeout(Duration::from_secs(30));
        assert_eq!(tool.execution_timeout(), Duration::from_secs(65));
    }

    #[test]
    fn test_execution_timeout_saturates() {
        let tool = tool_with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(tool.execution_timeout(), Duration::MAX);
    }

    #[test]
    fn test_identity_and_description_fallback() {
        let tool = tool_with_timeout(Duration::from_secs(30));
        assert_eq!(tool.name(), "composio_gmail_gmail_send_email");
        assert_eq!(tool.service(), "gmail");
        assert_eq!(tool.action(), "GMAIL_SEND_EMAIL");
        assert_eq!(tool.description(), "GMAIL_SEND_EMAIL");
    }
}
