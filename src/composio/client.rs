//! HTTP client for the Composio REST API.
//!
//! Every endpoint has one method here, and each method owns the normalization
//! of that endpoint's response shape. Everything above this layer only sees
//! the domain types from [`crate::composio::types`].

use std::sync::{PoisonError, RwLock};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::composio::error::{ComposioError, Result};
use crate::composio::types::{
    ActionDescriptor, ConnectedAccount, ConnectionRequest, Listing, RawAction, RawApp,
    RawConnection, RawConnectionRequest, RawIntegration, ServiceInfo,
};
use crate::config::ComposioConfig;

/// Maximum number of actions requested per discovery call.
pub const ACTION_PAGE_LIMIT: u32 = 50;

/// Maximum number of characters of an error body kept in messages.
pub const ERROR_BODY_LIMIT: usize = 500;

/// Thin typed wrapper over the upstream REST surface.
///
/// Holds the single connection pool for the bridge's lifetime. After
/// [`close`](Self::close) every request fails with [`ComposioError::Closed`].
pub struct ComposioClient {
    base_url: String,
    http: RwLock<Option<Client>>,
}

impl ComposioClient {
    /// Build a client with the API key installed as a default header.
    pub fn new(config: &ComposioConfig) -> Result<Self> {
        let mut key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| ComposioError::ClientBuild(format!("invalid API key header: {e}")))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ComposioError::ClientBuild(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: RwLock::new(Some(http)),
        })
    }

    /// Release the connection pool. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        self.http
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    // ── Discovery ───────────────────────────────────────────────────────

    /// `GET /v1/apps`
    pub async fn list_apps(&self) -> Result<Vec<ServiceInfo>> {
        let endpoint = "GET /v1/apps";
        let req = self.request(Method::GET, "/v1/apps")?;
        let listing: Listing<RawApp> = self.send_json(endpoint, req).await?;
        Ok(listing.into_items().into_iter().map(Into::into).collect())
    }

    /// `GET /v2/actions?appNames=<service>&limit=50`
    pub async fn list_actions(&self, service: &str) -> Result<Vec<ActionDescriptor>> {
        let endpoint = "GET /v2/actions";
        let limit = ACTION_PAGE_LIMIT.to_string();
        let req = self
            .request(Method::GET, "/v2/actions")?
            .query(&[("appNames", service), ("limit", limit.as_str())]);
        let listing: Listing<RawAction> = self.send_json(endpoint, req).await?;
        Ok(listing.into_items().into_iter().map(Into::into).collect())
    }

    // ── Integrations ────────────────────────────────────────────────────

    /// `GET /v1/integrations?appName=<service>`, returning integration ids.
    pub async fn list_integrations(&self, service: &str) -> Result<Vec<String>> {
        let endpoint = "GET /v1/integrations";
        let req = self
            .request(Method::GET, "/v1/integrations")?
            .query(&[("appName", service)]);
        let listing: Listing<RawIntegration> = self.send_json(endpoint, req).await?;
        Ok(listing
            .into_items()
            .into_iter()
            .filter_map(|i| crate::composio::types::non_empty(i.id))
            .collect())
    }

    /// `POST /v1/integrations` with upstream-managed auth.
    pub async fn create_integration(&self, service: &str, name: &str) -> Result<String> {
        let endpoint = "POST /v1/integrations";
        let req = self.request(Method::POST, "/v1/integrations")?.json(&json!({
            "appId": service,
            "name": name,
            "useComposioAuth": true,
        }));
        let created: RawIntegration = self.send_json(endpoint, req).await?;
        crate::composio::types::non_empty(created.id).ok_or_else(|| {
            ComposioError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: "response has no integration id".to_string(),
            }
        })
    }

    // ── Connected accounts ──────────────────────────────────────────────

    /// `POST /v1/connectedAccounts`
    pub async fn initiate_connection(
        &self,
        integration_id: &str,
        entity_id: &str,
        redirect_url: Option<&str>,
    ) -> Result<ConnectionRequest> {
        let endpoint = "POST /v1/connectedAccounts";
        let mut body = json!({
            "integrationId": integration_id,
            "entityId": entity_id,
        });
        if let Some(redirect) = redirect_url {
            body["redirectUri"] = Value::String(redirect.to_string());
        }
        let req = self
            .request(Method::POST, "/v1/connectedAccounts")?
            .json(&body);
        let raw: RawConnectionRequest = self.send_json(endpoint, req).await?;
        let request = ConnectionRequest::from(raw);
        if request.connection_id.is_empty() {
            return Err(ComposioError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: "response has no connection id".to_string(),
            });
        }
        Ok(request)
    }

    /// `GET /v1/connectedAccounts/{id}`
    pub async fn get_connection(&self, connection_id: &str) -> Result<ConnectedAccount> {
        let endpoint = "GET /v1/connectedAccounts/{id}";
        let path = format!(
            "/v1/connectedAccounts/{}",
            urlencoding::encode(connection_id)
        );
        let req = self.request(Method::GET, &path)?;
        let raw: RawConnection = self.send_json(endpoint, req).await?;
        Ok(raw.into_account(connection_id))
    }

    /// `GET /v1/connectedAccounts`
    pub async fn list_connections(&self) -> Result<Vec<ConnectedAccount>> {
        let endpoint = "GET /v1/connectedAccounts";
        let req = self.request(Method::GET, "/v1/connectedAccounts")?;
        let listing: Listing<RawConnection> = self.send_json(endpoint, req).await?;
        Ok(listing
            .into_items()
            .into_iter()
            .map(|raw| raw.into_account(""))
            .collect())
    }

    /// `DELETE /v1/connectedAccounts/{id}`
    pub async fn delete_connection(&self, connection_id: &str) -> Result<()> {
        let endpoint = "DELETE /v1/connectedAccounts/{id}";
        let path = format!(
            "/v1/connectedAccounts/{}",
            urlencoding::encode(connection_id)
        );
        let req = self.request(Method::DELETE, &path)?;
        self.send(endpoint, req).await?;
        Ok(())
    }

    // ── Execution ───────────────────────────────────────────────────────

    /// `POST /v2/actions/{name}/execute`, returning the raw JSON body.
    pub async fn execute_action(&self, action: &str, body: &Value) -> Result<Value> {
        let endpoint = format!("POST /v2/actions/{action}/execute");
        let path = format!("/v2/actions/{}/execute", urlencoding::encode(action));
        let req = self.request(Method::POST, &path)?.json(body);
        self.send_json(&endpoint, req).await
    }

    // ── Plumbing ────────────────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        // Clone the client out so no guard outlives this call.
        let http = self
            .http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ComposioError::Closed)?;
        Ok(http.request(method, format!("{}{}", self.base_url, path)))
    }

    async fn send(&self, endpoint: &str, req: RequestBuilder) -> Result<Response> {
        let response = req.send().await.map_err(|source| ComposioError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ComposioError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: truncate_chars(&body, ERROR_BODY_LIMIT),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(endpoint, req).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ComposioError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|e| ComposioError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Keep at most `limit` characters of `text`.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars(&"x".repeat(900), ERROR_BODY_LIMIT).len(), 500);
    }

    #[test]
    fn test_close_is_one_shot() {
        let client = ComposioClient::new(&ComposioConfig::new("key")).unwrap();
        assert!(!client.is_closed());
        assert!(client.close());
        assert!(client.is_closed());
        assert!(!client.close());
    }

    #[test]
    fn test_request_after_close_fails() {
        let client = ComposioClient::new(&ComposioConfig::new("key")).unwrap();
        client.close();
        assert!(matches!(
            client.request(Method::GET, "/v1/apps"),
            Err(ComposioError::Closed)
        ));
    }

    #[test]
    fn test_rejects_unprintable_key() {
        let err = ComposioClient::new(&ComposioConfig::new("bad\nkey"))
            .err()
            .unwrap();
        assert!(matches!(err, ComposioError::ClientBuild(_)));
    }
}
