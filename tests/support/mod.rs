//! In-process stand-in for the Composio REST API.
//!
//! Replies are scripted per route (`"METHOD /path"` or `"METHOD /path?query"`,
//! paths relative to the `/api` base). Unscripted routes answer 404. Every
//! request is recorded for later assertions.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tokio::task::JoinHandle;

use composio_bridge::config::ComposioConfig;

pub const API_KEY: &str = "test-key";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Default)]
struct MockState {
    replies: Mutex<HashMap<String, (u16, String)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockComposio {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockComposio {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("mock listener address");

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn config(&self) -> ComposioConfig {
        ComposioConfig::new(API_KEY).with_base_url(self.base_url())
    }

    /// Script a JSON reply for `route`.
    pub fn reply(&self, route: &str, status: u16, body: Value) {
        self.reply_text(route, status, body.to_string());
    }

    /// Script a raw-text reply for `route`.
    pub fn reply_text(&self, route: &str, status: u16, body: impl Into<String>) {
        self.state
            .replies
            .lock()
            .unwrap()
            .insert(route.to_string(), (status, body.into()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests whose `"METHOD /path"` equals `route` (query ignored).
    pub fn requests_to(&self, route: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.route() == route)
            .collect()
    }

    pub fn hits(&self, route: &str) -> usize {
        self.requests_to(route).len()
    }
}

impl Drop for MockComposio {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/api")
        .unwrap_or(uri.path())
        .to_string();
    let query = uri.query().map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        query: query.clone(),
        api_key: headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });

    let route = format!("{} {}", method, path);
    let reply = {
        let replies = state.replies.lock().unwrap();
        query
            .as_ref()
            .and_then(|q| replies.get(&format!("{route}?{q}")))
            .or_else(|| replies.get(&route))
            .cloned()
    };

    match reply {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, format!("no reply scripted for {route}")).into_response(),
    }
}
