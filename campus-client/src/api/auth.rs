//! Identity endpoints: credential exchange, token validation, logout and
//! profile updates

use super::ApiClient;
use crate::transport::ApiRequest;
use async_trait::async_trait;
use campus_core::{AuthBackend, CampusResult, Credentials, LoginResponse, ProfileUpdate, User};
use reqwest::Method;
use serde::Deserialize;
use tracing::info;

/// `/auth/me` answers either the user itself or `{ "user": ... }`
#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> CampusResult<User> {
        let response: MeResponse = self.client.put("/auth/profile", update).await?;
        Ok(response.into_user())
    }
}

impl MeResponse {
    fn into_user(self) -> User {
        match self {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        }
    }
}

#[async_trait]
impl AuthBackend for AuthApi {
    async fn login(&self, credentials: &Credentials) -> CampusResult<LoginResponse> {
        let response: LoginResponse = self.client.post("/auth/login", credentials).await?;
        info!(user_id = %response.user.id, role = %response.user.role, "Credential exchange succeeded");
        Ok(response)
    }

    async fn current_user(&self) -> CampusResult<User> {
        let response: MeResponse = self.client.get("/auth/me").await?;
        Ok(response.into_user())
    }

    async fn logout(&self) -> CampusResult<()> {
        self.client
            .send(ApiRequest::new(Method::POST, "/auth/logout"))
            .await?;
        Ok(())
    }
}
