//! Notification inbox

use super::{segment, ApiClient, ListEnvelope};
use campus_core::{CampusResult, Notification};
use serde::de::IgnoredAny;

#[derive(Clone)]
pub struct NotificationsApi {
    client: ApiClient,
}

impl NotificationsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> CampusResult<Vec<Notification>> {
        let notifications: ListEnvelope<Notification> = self.client.get("/notifications").await?;
        Ok(notifications.into_vec())
    }

    pub async fn mark_read(&self, notification_id: &str) -> CampusResult<()> {
        let _: IgnoredAny = self
            .client
            .patch(
                &format!("/notifications/{}/read", segment(notification_id)),
                &serde_json::json!({}),
            )
            .await?;
        Ok(())
    }

    pub async fn mark_all_read(&self) -> CampusResult<()> {
        let _: IgnoredAny = self
            .client
            .patch("/notifications/read-all", &serde_json::json!({}))
            .await?;
        Ok(())
    }
}
