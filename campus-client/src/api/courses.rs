//! Course catalogue endpoints

use super::{segment, ApiClient, ListEnvelope};
use campus_core::{CampusResult, Course, CourseDraft};

#[derive(Clone)]
pub struct CoursesApi {
    client: ApiClient,
}

impl CoursesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> CampusResult<Vec<Course>> {
        let courses: ListEnvelope<Course> = self.client.get("/courses").await?;
        Ok(courses.into_vec())
    }

    pub async fn get(&self, course_id: &str) -> CampusResult<Course> {
        self.client
            .get(&format!("/courses/{}", segment(course_id)))
            .await
    }

    pub async fn create(&self, draft: &CourseDraft) -> CampusResult<Course> {
        self.client.post("/courses", draft).await
    }

    pub async fn update(&self, course_id: &str, draft: &CourseDraft) -> CampusResult<Course> {
        self.client
            .put(&format!("/courses/{}", segment(course_id)), draft)
            .await
    }

    pub async fn delete(&self, course_id: &str) -> CampusResult<()> {
        self.client
            .delete(&format!("/courses/{}", segment(course_id)))
            .await
    }
}
