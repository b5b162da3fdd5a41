//! Enrollment endpoints for the signed-in student

use super::{segment, ApiClient, ListEnvelope};
use campus_core::{CampusResult, Enrollment};

#[derive(Clone)]
pub struct EnrollmentsApi {
    client: ApiClient,
}

impl EnrollmentsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn my_courses(&self) -> CampusResult<Vec<Enrollment>> {
        let enrollments: ListEnvelope<Enrollment> =
            self.client.get("/enrollments/my-courses").await?;
        Ok(enrollments.into_vec())
    }

    pub async fn enroll(&self, course_id: &str) -> CampusResult<Enrollment> {
        self.client
            .post(
                &format!("/enrollments/{}", segment(course_id)),
                &serde_json::json!({}),
            )
            .await
    }
}
