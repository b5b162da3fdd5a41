//! Campus Client - HTTP access to the learning backend
//!
//! Owns the one global request/response policy (bearer credentials out,
//! forced logout on 401) and the typed endpoint groups built on it.

pub mod api;
pub mod transport;

pub use api::{
    extract_error_message, AdminApi, ApiClient, AuthApi, AuthFailure, ClearTokenOnUnauthorized,
    CoursesApi, DashboardApi, EnrollmentsApi, NotificationsApi, ProgressApi, UnauthorizedHandler,
};
pub use reqwest::{Method, StatusCode};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

/// All endpoint groups sharing one [`ApiClient`]
#[derive(Clone)]
pub struct BackendApi {
    pub auth: AuthApi,
    pub courses: CoursesApi,
    pub enrollments: EnrollmentsApi,
    pub progress: ProgressApi,
    pub dashboard: DashboardApi,
    pub notifications: NotificationsApi,
    pub admin: AdminApi,
}

impl BackendApi {
    pub fn new(client: ApiClient) -> Self {
        Self {
            auth: AuthApi::new(client.clone()),
            courses: CoursesApi::new(client.clone()),
            enrollments: EnrollmentsApi::new(client.clone()),
            progress: ProgressApi::new(client.clone()),
            dashboard: DashboardApi::new(client.clone()),
            notifications: NotificationsApi::new(client.clone()),
            admin: AdminApi::new(client),
        }
    }
}
