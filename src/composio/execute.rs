//! Action execution.
//!
//! The only consumer of execution results is a conversational agent, so every
//! outcome, including failures, comes back as text.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::composio::client::ComposioClient;
use crate::composio::connection::ActiveAccounts;
use crate::composio::error::ComposioError;
use crate::composio::types::ConnectionStatus;

pub struct ExecutionRouter {
    client: Arc<ComposioClient>,
    accounts: Arc<ActiveAccounts>,
    entity_id: String,
}

impl ExecutionRouter {
    pub fn new(
        client: Arc<ComposioClient>,
        accounts: Arc<ActiveAccounts>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            accounts,
            entity_id: entity_id.into(),
        }
    }

    /// Execute `action` for `service` and render the outcome as text.
    pub async fn execute(&self, action: &str, arguments: Value, service: &str) -> String {
        let account_id = self.accounts.get(service);
        let body = self.request_body(arguments, account_id.as_deref());

        match self.client.execute_action(action, &body).await {
            Ok(value) => render_result(value),
            Err(e) => {
                tracing::error!("Composio action {} failed: {}", action, e);
                let mut message = describe_failure(action, &e);
                if let Some(account_id) = account_id
                    && !matches!(e, ComposioError::Closed)
                    && let Some(hint) = self.recheck_account(service, &account_id).await
                {
                    message.push('\n');
                    message.push_str(&hint);
                }
                message
            }
        }
    }

    fn request_body(&self, arguments: Value, account_id: Option<&str>) -> Value {
        let mut body = json!({ "input": arguments });
        if let Some(id) = account_id {
            body["connectedAccountId"] = Value::String(id.to_string());
        }
        body["entityId"] = Value::String(self.entity_id.clone());
        body
    }

    /// After a failed call, confirm the bound account is still usable. If it
    /// is not, drop the binding so later calls stop sending a dead credential.
    async fn recheck_account(&self, service: &str, account_id: &str) -> Option<String> {
        let status = match self.client.get_connection(account_id).await {
            Ok(account) => account.status,
            Err(e) => {
                tracing::debug!("Could not re-check account {}: {}", account_id, e);
                return None;
            }
        };
        if status.is_active() {
            return None;
        }
        self.accounts.forget_if(service, account_id);
        tracing::warn!(
            "Connected account {} for {} is {}, unbinding it",
            account_id,
            service,
            status
        );
        Some(stale_account_hint(service, &status))
    }
}

fn stale_account_hint(service: &str, status: &ConnectionStatus) -> String {
    format!(
        "The {service} connection is no longer active (status {status}). Reconnect {service} and try again."
    )
}

/// Human-readable failure text for an execution error.
pub fn describe_failure(action: &str, error: &ComposioError) -> String {
    match error {
        ComposioError::Status { status, body, .. } => {
            format!("Error executing {action}: HTTP {status}: {body}")
        }
        other => format!("Error executing {action}: {other}"),
    }
}

/// Normalize an execute response into text.
///
/// Objects prefer their `data` payload, then `response_data`, then the whole
/// object. Objects and arrays are pretty-printed; strings pass through.
pub fn render_result(value: Value) -> String {
    let resolved = match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => match map.remove("response_data") {
                Some(data) => data,
                None => Value::Object(map),
            },
        },
        other => other,
    };

    match resolved {
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(&resolved).unwrap_or_else(|_| resolved.to_string())
        }
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_render_prefers_data() {
        let out = render_result(json!({"data": {"id": "m1"}, "successful": true}));
        assert_eq!(out, "{\n  \"id\": \"m1\"\n}");
    }

    #[test]
    fn test_render_falls_back_to_response_data() {
        let out = render_result(json!({"response_data": ["a", "b"], "error": null}));
        assert_eq!(out, "[\n  \"a\",\n  \"b\"\n]");
    }

    #[test]
    fn test_render_whole_object() {
        let out = render_result(json!({"ok": true}));
        assert_eq!(out, "{\n  \"ok\": true\n}");
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(render_result(json!({"data": "sent"})), "sent");
        assert_eq!(render_result(json!({"data": 3})), "3");
        assert_eq!(render_result(json!({"data": null})), "null");
        assert_eq!(render_result(json!("plain")), "plain");
        assert_eq!(render_result(json!(false)), "false");
    }

    #[test]
    fn test_render_keeps_non_ascii() {
        let out = render_result(json!({"data": {"subject": "Café ☕"}}));
        assert!(out.contains("Café ☕"));
    }

    #[test]
    fn test_describe_status_failure() {
        let err = ComposioError::Status {
            endpoint: "POST /v2/actions/GMAIL_SEND_EMAIL/execute".to_string(),
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(
            describe_failure("GMAIL_SEND_EMAIL", &err),
            "Error executing GMAIL_SEND_EMAIL: HTTP 500: boom"
        );
    }

    #[test]
    fn test_describe_closed() {
        let text = describe_failure("SLACK_POST", &ComposioError::Closed);
        assert!(text.starts_with("Error executing SLACK_POST"));
    }
}
