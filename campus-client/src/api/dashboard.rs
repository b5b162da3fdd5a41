//! Role dashboards

use super::ApiClient;
use campus_core::{CampusResult, DashboardSummary, Role};

#[derive(Clone)]
pub struct DashboardApi {
    client: ApiClient,
}

impl DashboardApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn summary(&self, role: Role) -> CampusResult<DashboardSummary> {
        self.client.get(&format!("/dashboard/{}", role)).await
    }
}
