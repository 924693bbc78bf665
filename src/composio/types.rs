//! Domain types for the Composio bridge and the raw upstream shapes they are
//! normalized from.

use serde::{Deserialize, Serialize};

use crate::tools::empty_object_schema;

/// An external service offered by the marketplace (Gmail, Slack, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Lowercase slug used as the service key everywhere else.
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub logo: String,
    pub categories: Vec<String>,
}

/// One upstream action, as discovered. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Upstream identifier, unique within a service.
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// JSON Schema for the call arguments.
    pub parameters: serde_json::Value,
}

/// Connection status as reported upstream.
///
/// The vocabulary belongs to the marketplace; only [`ConnectionStatus::Active`]
/// means the account can back action execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionStatus {
    Active,
    Initiated,
    Pending,
    Failed,
    Error,
    Unknown,
    Other(String),
}

impl ConnectionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Initiated => "INITIATED",
            Self::Pending => "PENDING",
            Self::Failed => "FAILED",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for ConnectionStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Self::Active,
            "INITIATED" => Self::Initiated,
            "PENDING" => Self::Pending,
            "FAILED" => Self::Failed,
            "ERROR" => Self::Error,
            "" | "UNKNOWN" => Self::Unknown,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for ConnectionStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ConnectionStatus> for String {
    fn from(value: ConnectionStatus) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An upstream connected account (one credential binding for a service).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub id: String,
    /// Service slug; empty when the upstream did not say.
    pub service: String,
    pub status: ConnectionStatus,
}

/// Result of starting an OAuth connection flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    /// Where the user should be sent to authorize.
    pub url: String,
    pub connection_id: String,
}

/// Summary used by health/status surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Whether the upstream answered the connection listing.
    pub connected: bool,
    /// Services with at least one active account.
    pub services: Vec<String>,
    pub total_connections: usize,
    pub active_connections: usize,
}

impl BridgeStatus {
    pub(crate) fn from_accounts(accounts: &[ConnectedAccount]) -> Self {
        let mut services: Vec<String> = Vec::new();
        let mut active = 0;
        for account in accounts.iter().filter(|a| a.status.is_active()) {
            active += 1;
            if !account.service.is_empty() && !services.contains(&account.service) {
                services.push(account.service.clone());
            }
        }
        Self {
            connected: true,
            services,
            total_connections: accounts.len(),
            active_connections: active,
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            connected: false,
            services: Vec::new(),
            total_connections: 0,
            active_connections: 0,
        }
    }
}

// ── Upstream shapes ─────────────────────────────────────────────────────

/// List endpoints answer either with a bare array or `{"items": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(default)]
        items: Vec<T>,
    },
}

impl<T> Listing<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { items } => items,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawApp {
    key: Option<String>,
    name: Option<String>,
    description: Option<String>,
    logo: Option<String>,
    categories: Option<Vec<String>>,
}

impl From<RawApp> for ServiceInfo {
    fn from(raw: RawApp) -> Self {
        let name = non_empty(raw.key.clone())
            .or_else(|| non_empty(raw.name.clone()))
            .unwrap_or_default();
        let display_name = non_empty(raw.name)
            .or_else(|| non_empty(raw.key))
            .unwrap_or_default();
        Self {
            name,
            display_name,
            description: raw.description.unwrap_or_default(),
            logo: raw.logo.unwrap_or_default(),
            categories: raw.categories.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawAction {
    name: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    description: Option<String>,
    parameters: Option<serde_json::Value>,
}

impl From<RawAction> for ActionDescriptor {
    fn from(raw: RawAction) -> Self {
        let name = raw.name.unwrap_or_default();
        let display_name = non_empty(raw.display_name).unwrap_or_else(|| name.clone());
        let parameters = match raw.parameters {
            Some(schema @ serde_json::Value::Object(_)) => schema,
            _ => empty_object_schema(),
        };
        Self {
            name,
            display_name,
            description: raw.description.unwrap_or_default(),
            parameters,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawConnection {
    id: Option<String>,
    #[serde(rename = "appName")]
    app_name: Option<String>,
    status: Option<String>,
}

impl RawConnection {
    pub(crate) fn into_account(self, fallback_id: &str) -> ConnectedAccount {
        ConnectedAccount {
            id: non_empty(self.id).unwrap_or_else(|| fallback_id.to_string()),
            service: self.app_name.unwrap_or_default().to_lowercase(),
            status: self
                .status
                .map(ConnectionStatus::from)
                .unwrap_or(ConnectionStatus::Unknown),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawIntegration {
    pub(crate) id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawConnectionRequest {
    #[serde(rename = "redirectUrl")]
    redirect_url: Option<String>,
    url: Option<String>,
    id: Option<String>,
    #[serde(rename = "connectedAccountId")]
    connected_account_id: Option<String>,
}

impl From<RawConnectionRequest> for ConnectionRequest {
    fn from(raw: RawConnectionRequest) -> Self {
        Self {
            url: non_empty(raw.redirect_url)
                .or_else(|| non_empty(raw.url))
                .unwrap_or_default(),
            connection_id: non_empty(raw.id)
                .or_else(|| non_empty(raw.connected_account_id))
                .unwrap_or_default(),
        }
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn parse<T: serde::de::DeserializeOwned + Default>(value: serde_json::Value) -> Vec<T> {
        serde_json::from_value::<Listing<T>>(value)
            .unwrap()
            .into_items()
    }

    #[test]
    fn test_listing_bare_and_wrapped() {
        let bare: Vec<RawIntegration> = parse(json!([{"id": "a"}, {"id": "b"}]));
        let wrapped: Vec<RawIntegration> = parse(json!({"items": [{"id": "a"}], "total": 1}));
        let empty: Vec<RawIntegration> = parse(json!({"total": 0}));
        assert_eq!(bare.len(), 2);
        assert_eq!(wrapped.len(), 1);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_action_defaults() {
        let actions: Vec<RawAction> = parse(json!({"items": [
            {"name": "GMAIL_SEND_EMAIL", "description": null},
            {"name": "GMAIL_LIST", "displayName": "List", "parameters": "nope"}
        ]}));
        let actions: Vec<ActionDescriptor> = actions.into_iter().map(Into::into).collect();

        assert_eq!(actions[0].display_name, "GMAIL_SEND_EMAIL");
        assert_eq!(actions[0].description, "");
        assert_eq!(actions[0].parameters, empty_object_schema());
        assert_eq!(actions[1].display_name, "List");
        assert_eq!(actions[1].parameters, empty_object_schema());
    }

    #[test]
    fn test_action_keeps_schema() {
        let schema = json!({"type": "object", "properties": {"to": {"type": "string"}}});
        let actions: Vec<RawAction> = parse(json!([{"name": "A", "parameters": schema.clone()}]));
        let action = ActionDescriptor::from(actions.into_iter().next().unwrap());
        assert_eq!(action.parameters, schema);
    }

    #[test]
    fn test_app_name_fallbacks() {
        let apps: Vec<RawApp> = parse(json!([
            {"key": "gmail", "name": "Gmail", "categories": ["mail"]},
            {"name": "Slack"}
        ]));
        let apps: Vec<ServiceInfo> = apps.into_iter().map(Into::into).collect();
        assert_eq!(apps[0].name, "gmail");
        assert_eq!(apps[0].display_name, "Gmail");
        assert_eq!(apps[0].categories, vec!["mail"]);
        assert_eq!(apps[1].name, "Slack");
        assert_eq!(apps[1].display_name, "Slack");
    }

    #[test]
    fn test_connection_status_vocabulary() {
        assert!(ConnectionStatus::from("ACTIVE").is_active());
        assert!(ConnectionStatus::from("active").is_active());
        assert_eq!(ConnectionStatus::from("INITIATED"), ConnectionStatus::Initiated);
        assert_eq!(ConnectionStatus::from(""), ConnectionStatus::Unknown);
        assert_eq!(
            ConnectionStatus::from("EXPIRED"),
            ConnectionStatus::Other("EXPIRED".to_string())
        );
        assert_eq!(ConnectionStatus::from("EXPIRED").to_string(), "EXPIRED");
    }

    #[test]
    fn test_connection_status_serde() {
        let status: ConnectionStatus = serde_json::from_value(json!("ACTIVE")).unwrap();
        assert_eq!(status, ConnectionStatus::Active);
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("ACTIVE"));
    }

    #[test]
    fn test_raw_connection_fallbacks() {
        let raw: RawConnection = serde_json::from_value(json!({"appName": "Gmail"})).unwrap();
        let account = raw.into_account("ca_1");
        assert_eq!(account.id, "ca_1");
        assert_eq!(account.service, "gmail");
        assert_eq!(account.status, ConnectionStatus::Unknown);
    }

    #[test]
    fn test_connection_request_fallbacks() {
        let raw: RawConnectionRequest =
            serde_json::from_value(json!({"url": "https://auth", "connectedAccountId": "ca_9"}))
                .unwrap();
        let request = ConnectionRequest::from(raw);
        assert_eq!(request.url, "https://auth");
        assert_eq!(request.connection_id, "ca_9");
    }

    #[test]
    fn test_status_counts_active_only() {
        let accounts = vec![
            ConnectedAccount {
                id: "1".into(),
                service: "gmail".into(),
                status: ConnectionStatus::Active,
            },
            ConnectedAccount {
                id: "2".into(),
                service: "slack".into(),
                status: ConnectionStatus::Error,
            },
        ];
        let status = BridgeStatus::from_accounts(&accounts);
        assert!(status.connected);
        assert_eq!(status.total_connections, 2);
        assert_eq!(status.active_connections, 1);
        assert_eq!(status.services, vec!["gmail"]);
    }
}
