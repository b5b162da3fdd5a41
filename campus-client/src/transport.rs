//! Wire-level request/response types and the transport seam
//!
//! `ApiClient` never talks to reqwest directly; it goes through
//! [`HttpTransport`] so tests can script the backend.

use async_trait::async_trait;
use campus_core::{ApiConfig, CampusError, CampusResult, ErrorContext};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Method, StatusCode};
use tracing::debug;

/// An outbound request, relative to the API base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A response with its body already read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request. Only transport failures are errors here; every HTTP
    /// status, including 4xx and 5xx, comes back as `Ok`.
    async fn send(&self, request: ApiRequest) -> CampusResult<ApiResponse>;
}

/// Transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> CampusResult<Self> {
        let base_url = url::Url::parse(&config.base_url).map_err(|e| CampusError::Config {
            message: format!("Invalid API base URL '{}': {}", config.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_transport").with_operation("new"),
        })?;

        Ok(Self {
            client: create_http_client(config)?,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> CampusResult<ApiResponse> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, url = %url, "Sending API request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| network_error(e, &request.method, &request.path))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| network_error(e, &request.method, &request.path))?;

        debug!(status = status.as_u16(), path = %request.path, "Received API response");
        Ok(ApiResponse { status, body })
    }
}

fn network_error(error: reqwest::Error, method: &Method, path: &str) -> CampusError {
    let suggestion = if error.is_timeout() {
        "The backend did not answer in time; try again"
    } else if error.is_connect() {
        "Check that the backend is reachable at api.base_url"
    } else {
        "Check network connectivity"
    };

    CampusError::Network {
        message: format!("{} {} failed: {}", method, path, error),
        source: Some(Box::new(error)),
        context: ErrorContext::new("http_transport")
            .with_operation("send")
            .with_suggestion(suggestion),
    }
}

/// Build the HTTP client with common configuration
pub(crate) fn create_http_client(config: &ApiConfig) -> CampusResult<reqwest::Client> {
    let mut headers = HeaderMap::new();

    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).map_err(|e| CampusError::Config {
            message: format!("Invalid user agent: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| CampusError::Internal {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}
