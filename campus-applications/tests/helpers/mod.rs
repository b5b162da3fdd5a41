//! Shared fixtures: a scripted backend and a fully wired app

#![allow(dead_code)]

use async_trait::async_trait;
use campus_applications::{CampusApp, MemoryTokenStore, NavigationHistory};
use campus_client::{ApiRequest, ApiResponse, HttpTransport, Method, StatusCode};
use campus_core::{CampusError, CampusResult, ErrorContext};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Empty(u16),
    /// The connection fails before any status arrives
    NetworkDown,
    /// Same reply after a pause, to keep a request in flight
    Delayed(Duration, Box<Reply>),
}

/// Backend answering by (method, path) and counting every call
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), Reply>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes.lock().insert((method, path.to_string()), reply);
        self
    }

    pub fn json(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.on(method, path, Reply::Json(status, body))
    }

    pub fn calls_to(&self, method: &Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|request| &request.method == method && request.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    /// Authorization header of the most recent call to `path`
    pub fn authorization_for(&self, path: &str) -> Option<String> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|request| request.path == path)
            .and_then(|request| request.headers.get("authorization"))
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    pub fn last_body(&self, path: &str) -> Option<Value> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|request| request.path == path)
            .and_then(|request| request.body.clone())
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> CampusResult<ApiResponse> {
        let reply = self
            .routes
            .lock()
            .get(&(request.method.clone(), request.path.clone()))
            .cloned();
        self.calls.lock().push(request);

        let mut reply = reply.unwrap_or(Reply::Json(404, json!({"message": "Not found"})));
        loop {
            match reply {
                Reply::Delayed(pause, inner) => {
                    tokio::time::sleep(pause).await;
                    reply = *inner;
                }
                Reply::Json(status, body) => return Ok(response(status, body.to_string())),
                Reply::Empty(status) => return Ok(response(status, String::new())),
                Reply::NetworkDown => {
                    return Err(CampusError::Network {
                        message: "connection refused".to_string(),
                        source: None,
                        context: ErrorContext::new("scripted_transport"),
                    })
                }
            }
        }
    }
}

fn response(status: u16, body: String) -> ApiResponse {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    ApiResponse::new(status, body)
}

pub fn user_json(id: u64, email: &str, role: &str) -> Value {
    json!({"id": id, "email": email, "name": "Test User", "role": role})
}

pub struct Harness {
    pub app: CampusApp,
    pub backend: Arc<ScriptedTransport>,
    pub tokens: Arc<MemoryTokenStore>,
    pub history: Arc<NavigationHistory>,
}

pub fn harness(token: Option<&str>) -> Harness {
    harness_with_stale_time(token, Duration::from_secs(60))
}

pub fn harness_with_stale_time(token: Option<&str>, stale_time: Duration) -> Harness {
    let backend = ScriptedTransport::new();
    let tokens = Arc::new(match token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::new(),
    });
    let history = Arc::new(NavigationHistory::new());
    let app = CampusApp::new(backend.clone(), tokens.clone(), history.clone(), stale_time);

    Harness {
        app,
        backend,
        tokens,
        history,
    }
}
