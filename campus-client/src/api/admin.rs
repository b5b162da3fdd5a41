//! Administrative user management

use super::{segment, ApiClient, ListEnvelope};
use campus_core::{CampusResult, Role, User};

#[derive(Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn users(&self) -> CampusResult<Vec<User>> {
        let users: ListEnvelope<User> = self.client.get("/admin/users").await?;
        Ok(users.into_vec())
    }

    pub async fn update_role(&self, user_id: &str, role: Role) -> CampusResult<User> {
        self.client
            .patch(
                &format!("/admin/users/{}/role", segment(user_id)),
                &serde_json::json!({ "role": role }),
            )
            .await
    }
}
