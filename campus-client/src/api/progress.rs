//! Lesson progress endpoints

use super::{segment, ApiClient};
use campus_core::{CampusResult, CourseProgress};

#[derive(Clone)]
pub struct ProgressApi {
    client: ApiClient,
}

impl ProgressApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn course(&self, course_id: &str) -> CampusResult<CourseProgress> {
        self.client
            .get(&format!("/progress/{}", segment(course_id)))
            .await
    }

    pub async fn complete_lesson(
        &self,
        course_id: &str,
        lesson_id: &str,
    ) -> CampusResult<CourseProgress> {
        self.client
            .post(
                &format!(
                    "/progress/{}/lessons/{}/complete",
                    segment(course_id),
                    segment(lesson_id)
                ),
                &serde_json::json!({}),
            )
            .await
    }
}
