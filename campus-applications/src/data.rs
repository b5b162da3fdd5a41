//! Learning data service
//!
//! Typed reads through the query cache and mutations that invalidate what
//! they make obsolete. Screens use this instead of the raw endpoint groups.

use crate::progress::{merge_overview, CourseOverview};
use crate::query::{query_keys, Mutation, QueryCache, QueryKey, QuerySnapshot};
use crate::session::SessionStore;
use crate::{ApplicationError, ApplicationResult};
use campus_client::BackendApi;
use campus_core::{
    CampusResult, Course, CourseDraft, CourseProgress, DashboardSummary, Enrollment,
    Notification, ProfileUpdate, Role, User,
};
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info};

#[derive(Clone)]
pub struct LearningData {
    api: BackendApi,
    cache: QueryCache,
    session: SessionStore,
}

impl LearningData {
    pub fn new(api: BackendApi, cache: QueryCache, session: SessionStore) -> Self {
        Self {
            api,
            cache,
            session,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // Reads

    pub async fn courses(&self) -> ApplicationResult<Vec<Course>> {
        let api = self.api.courses.clone();
        self.read(query_keys::courses(), move || async move { api.list().await })
            .await
    }

    pub async fn course(&self, course_id: &str) -> ApplicationResult<Course> {
        let api = self.api.courses.clone();
        let id = course_id.to_string();
        self.read(query_keys::course(course_id), move || async move {
            api.get(&id).await
        })
        .await
    }

    pub async fn my_enrollments(&self) -> ApplicationResult<Vec<Enrollment>> {
        let api = self.api.enrollments.clone();
        self.read(query_keys::my_enrollments(), move || async move {
            api.my_courses().await
        })
        .await
    }

    pub async fn course_progress(&self, course_id: &str) -> ApplicationResult<CourseProgress> {
        let api = self.api.progress.clone();
        let id = course_id.to_string();
        self.read(query_keys::course_progress(course_id), move || async move {
            api.course(&id).await
        })
        .await
    }

    pub async fn dashboard(&self, role: Role) -> ApplicationResult<DashboardSummary> {
        let api = self.api.dashboard.clone();
        self.read(query_keys::role_dashboard(role), move || async move {
            api.summary(role).await
        })
        .await
    }

    /// Whatever dashboard figures are cached right now, refreshing in the
    /// background if they are stale
    pub fn dashboard_snapshot(&self, role: Role) -> QuerySnapshot {
        let api = self.api.dashboard.clone();
        self.cache.query(&query_keys::role_dashboard(role), move || async move {
            let summary = api.summary(role).await?;
            Ok(Value::Object(summary))
        })
    }

    pub async fn notifications(&self) -> ApplicationResult<Vec<Notification>> {
        let api = self.api.notifications.clone();
        self.read(query_keys::notifications(), move || async move {
            api.list().await
        })
        .await
    }

    pub async fn admin_users(&self) -> ApplicationResult<Vec<User>> {
        let api = self.api.admin.clone();
        self.read(query_keys::admin_users(), move || async move { api.users().await })
            .await
    }

    /// Enrolled courses joined with their progress records
    pub async fn overview(&self) -> ApplicationResult<Vec<CourseOverview>> {
        let enrollments = self.my_enrollments().await?;
        let progress = try_join_all(
            enrollments
                .iter()
                .map(|enrollment| self.course_progress(&enrollment.course_id)),
        )
        .await?;
        Ok(merge_overview(&enrollments, &progress))
    }

    // Mutations

    pub async fn enroll(&self, course_id: &str) -> ApplicationResult<Enrollment> {
        self.mutate(
            Mutation::Enroll {
                course_id: course_id.to_string(),
            },
            self.api.enrollments.enroll(course_id),
        )
        .await
    }

    pub async fn complete_lesson(
        &self,
        course_id: &str,
        lesson_id: &str,
    ) -> ApplicationResult<CourseProgress> {
        self.mutate(
            Mutation::MarkLessonComplete {
                course_id: course_id.to_string(),
                lesson_id: lesson_id.to_string(),
            },
            self.api.progress.complete_lesson(course_id, lesson_id),
        )
        .await
    }

    pub async fn create_course(&self, draft: &CourseDraft) -> ApplicationResult<Course> {
        self.mutate(Mutation::CreateCourse, self.api.courses.create(draft))
            .await
    }

    pub async fn update_course(
        &self,
        course_id: &str,
        draft: &CourseDraft,
    ) -> ApplicationResult<Course> {
        self.mutate(
            Mutation::UpdateCourse {
                course_id: course_id.to_string(),
            },
            self.api.courses.update(course_id, draft),
        )
        .await
    }

    pub async fn delete_course(&self, course_id: &str) -> ApplicationResult<()> {
        self.mutate(
            Mutation::DeleteCourse {
                course_id: course_id.to_string(),
            },
            self.api.courses.delete(course_id),
        )
        .await
    }

    /// Update the own profile; the session identity follows the new record
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApplicationResult<User> {
        let user = self
            .mutate(Mutation::UpdateProfile, self.api.auth.update_profile(update))
            .await?;
        self.session.update_identity(user.clone());
        Ok(user)
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> ApplicationResult<()> {
        self.mutate(
            Mutation::MarkNotificationRead {
                notification_id: notification_id.to_string(),
            },
            self.api.notifications.mark_read(notification_id),
        )
        .await
    }

    pub async fn mark_all_notifications_read(&self) -> ApplicationResult<()> {
        self.mutate(
            Mutation::MarkAllNotificationsRead,
            self.api.notifications.mark_all_read(),
        )
        .await
    }

    pub async fn update_user_role(&self, user_id: &str, role: Role) -> ApplicationResult<User> {
        self.mutate(
            Mutation::UpdateUserRole {
                user_id: user_id.to_string(),
            },
            self.api.admin.update_role(user_id, role),
        )
        .await
    }

    async fn read<T, F, Fut>(&self, key: QueryKey, fetch: F) -> ApplicationResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = CampusResult<T>> + Send + 'static,
    {
        let value = self
            .cache
            .fetch_query(&key, move || async move {
                let data = fetch().await?;
                Ok(serde_json::to_value(data)?)
            })
            .await
            .map_err(ApplicationError::Fetch)?;

        Ok(T::deserialize(value.as_ref())?)
    }

    async fn mutate<T, Fut>(&self, mutation: Mutation, request: Fut) -> ApplicationResult<T>
    where
        Fut: Future<Output = CampusResult<T>>,
    {
        match request.await {
            Ok(output) => {
                let invalidated = self.cache.invalidate_many(&mutation.dependent_keys());
                info!(mutation = mutation.name(), invalidated, "Mutation applied");
                Ok(output)
            }
            Err(e) => {
                debug!(mutation = mutation.name(), error = %e, "Mutation failed, cache untouched");
                Err(e.into())
            }
        }
    }
}
