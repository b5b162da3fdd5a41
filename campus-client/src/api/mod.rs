//! API client for the learning backend
//!
//! [`ApiClient`] is the single place where outbound requests are augmented
//! and responses are screened:
//!
//! - every request reads the persisted token and, when one exists, carries
//!   `Authorization: Bearer <token>`;
//! - every 401 response runs the registered [`UnauthorizedHandler`] before
//!   the error reaches the caller, whichever endpoint produced it;
//! - all other error statuses are passed through as [`CampusError::Api`].
//!
//! The typed endpoint groups (`AuthApi`, `CoursesApi`, ...) are thin wrappers
//! over it.

use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
use campus_core::{CampusError, CampusResult, ErrorContext, TokenStore};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub mod admin;
pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod notifications;
pub mod progress;

#[cfg(test)]
mod tests;

pub use admin::AdminApi;
pub use auth::AuthApi;
pub use courses::CoursesApi;
pub use dashboard::DashboardApi;
pub use enrollments::EnrollmentsApi;
pub use notifications::NotificationsApi;
pub use progress::ProgressApi;

/// The request that was answered with 401
#[derive(Debug, Clone)]
pub struct AuthFailure {
    pub method: Method,
    pub path: String,
}

/// Global reaction to an authorization failure
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self, failure: &AuthFailure);
}

/// Fallback policy when no session is wired in: forget the token
pub struct ClearTokenOnUnauthorized {
    tokens: Arc<dyn TokenStore>,
}

impl ClearTokenOnUnauthorized {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }
}

impl UnauthorizedHandler for ClearTokenOnUnauthorized {
    fn on_unauthorized(&self, failure: &AuthFailure) {
        if let Err(e) = self.tokens.remove() {
            warn!(path = %failure.path, error = %e, "Failed to remove token after 401");
        }
    }
}

/// HTTP client wrapper with credential injection and the global 401 policy
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenStore>,
    unauthorized: Arc<dyn UnauthorizedHandler>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, tokens: Arc<dyn TokenStore>) -> Self {
        let unauthorized = Arc::new(ClearTokenOnUnauthorized::new(tokens.clone()));
        Self {
            transport,
            tokens,
            unauthorized,
        }
    }

    /// Replace the 401 policy
    pub fn with_unauthorized_handler(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.unauthorized = handler;
        self
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Send a request through both interceptors.
    ///
    /// Returns the response only for 2xx/3xx statuses.
    pub async fn send(&self, mut request: ApiRequest) -> CampusResult<ApiResponse> {
        self.attach_credentials(&mut request);

        let method = request.method.clone();
        let path = request.path.clone();
        let response = self.transport.send(request).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            warn!(method = %method, path = %path, "Backend rejected credentials");
            self.unauthorized
                .on_unauthorized(&AuthFailure {
                    method: method.clone(),
                    path: path.clone(),
                });
            let error = CampusError::Unauthorized {
                message: extract_error_message(response.status, &response.body),
                context: ErrorContext::new("api_client")
                    .with_operation(&path)
                    .with_metadata("method", method.as_str())
                    .with_suggestion("Log in again"),
            };
            error.log();
            return Err(error);
        }

        if response.status.is_client_error() || response.status.is_server_error() {
            let error = handle_response_error(&response, &method, &path);
            error.log();
            return Err(error);
        }

        Ok(response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> CampusResult<T> {
        let response = self.send(ApiRequest::new(Method::GET, path)).await?;
        decode(&response, path)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> CampusResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> CampusResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> CampusResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn delete(&self, path: &str) -> CampusResult<()> {
        self.send(ApiRequest::new(Method::DELETE, path)).await?;
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> CampusResult<T> {
        let mut request = ApiRequest::new(method, path);
        request.body = body;
        let response = self.send(request).await?;
        decode(&response, path)
    }

    fn attach_credentials(&self, request: &mut ApiRequest) {
        let token = match self.tokens.get() {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return,
            Err(e) => {
                warn!(error = %e, "Token store unreadable, sending request without credentials");
                return;
            }
        };

        match HeaderValue::from_str(&token.bearer()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Persisted token is not a valid header value, ignoring it"),
        }
    }
}

/// Decode a JSON body. An empty body decodes as JSON `null`, so `()` and
/// `Option<T>` work for endpoints that answer 204.
fn decode<T: DeserializeOwned>(response: &ApiResponse, path: &str) -> CampusResult<T> {
    let result = if response.body.trim().is_empty() {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_str(&response.body)
    };

    result.map_err(|e| {
        debug!(path = %path, error = %e, "Response body did not match the expected shape");
        CampusError::Serialization(e)
    })
}

/// Turn a non-success response into an error carrying the backend's message
pub(crate) fn handle_response_error(
    response: &ApiResponse,
    method: &Method,
    path: &str,
) -> CampusError {
    let status = response.status;
    CampusError::Api {
        status: status.as_u16(),
        message: extract_error_message(status, &response.body),
        context: ErrorContext::new("api_client")
            .with_operation(&format!("{} {}", method, path))
            .with_metadata("status", status.as_str())
            .with_suggestion(match status.as_u16() {
                403 => "Your role does not allow this action",
                404 => "The resource does not exist or was removed",
                409 | 422 => "Check the submitted values",
                s if s >= 500 => "The backend failed; try again later",
                _ => "Check the request",
            }),
    }
}

/// Human-readable message from an error payload.
///
/// Looks at `message`, `detail` and `error` in that order, then falls back
/// to a short raw body, then to the status reason.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(payload)) = serde_json::from_str(body) {
        for field in ["message", "detail", "error"] {
            match payload.get(field) {
                Some(serde_json::Value::String(text)) if !text.is_empty() => {
                    return text.clone()
                }
                Some(serde_json::Value::Null) | None => continue,
                Some(other) => return other.to_string(),
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<') {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}

/// List endpoints answer either a bare array or an object wrapping it
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "data", alias = "results")]
        items: Vec<T>,
    },
}

impl<T> ListEnvelope<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) | ListEnvelope::Wrapped { items } => items,
        }
    }
}

/// Percent-encode an id for use as a path segment
pub(crate) fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}
