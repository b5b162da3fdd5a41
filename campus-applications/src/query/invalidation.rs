//! Mutation dependency graph
//!
//! The one place that says which cached reads a state-changing operation
//! makes obsolete. Call sites name the mutation; they never list keys.

use super::keys::{keys, QueryKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Enroll { course_id: String },
    MarkLessonComplete { course_id: String, lesson_id: String },
    CreateCourse,
    UpdateCourse { course_id: String },
    DeleteCourse { course_id: String },
    UpdateProfile,
    MarkNotificationRead { notification_id: String },
    MarkAllNotificationsRead,
    UpdateUserRole { user_id: String },
}

impl Mutation {
    /// Key prefixes to invalidate after this mutation succeeds
    pub fn dependent_keys(&self) -> Vec<QueryKey> {
        match self {
            Mutation::Enroll { .. } => vec![keys::enrollments(), keys::dashboard()],
            Mutation::MarkLessonComplete { .. } => {
                vec![keys::progress(), keys::enrollments(), keys::dashboard()]
            }
            Mutation::CreateCourse
            | Mutation::UpdateCourse { .. }
            | Mutation::DeleteCourse { .. } => vec![keys::courses(), keys::dashboard()],
            Mutation::UpdateProfile => vec![keys::current_user(), keys::admin_users()],
            Mutation::MarkNotificationRead { .. } | Mutation::MarkAllNotificationsRead => {
                vec![keys::notifications()]
            }
            Mutation::UpdateUserRole { .. } => vec![keys::admin(), keys::dashboard()],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Enroll { .. } => "enroll",
            Mutation::MarkLessonComplete { .. } => "mark_lesson_complete",
            Mutation::CreateCourse => "create_course",
            Mutation::UpdateCourse { .. } => "update_course",
            Mutation::DeleteCourse { .. } => "delete_course",
            Mutation::UpdateProfile => "update_profile",
            Mutation::MarkNotificationRead { .. } => "mark_notification_read",
            Mutation::MarkAllNotificationsRead => "mark_all_notifications_read",
            Mutation::UpdateUserRole { .. } => "update_user_role",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::Role;

    fn covers(mutation: &Mutation, key: &QueryKey) -> bool {
        mutation
            .dependent_keys()
            .iter()
            .any(|prefix| key.starts_with(prefix))
    }

    #[test]
    fn test_enroll_invalidates_enrollments_and_every_dashboard() {
        let enroll = Mutation::Enroll {
            course_id: "7".to_string(),
        };
        assert!(covers(&enroll, &keys::my_enrollments()));
        for role in [Role::Student, Role::Teacher, Role::Admin] {
            assert!(covers(&enroll, &keys::role_dashboard(role)));
        }
        assert!(!covers(&enroll, &keys::courses()));
        assert!(!covers(&enroll, &keys::notifications()));
    }

    #[test]
    fn test_lesson_completion_invalidates_progress() {
        let complete = Mutation::MarkLessonComplete {
            course_id: "7".to_string(),
            lesson_id: "3".to_string(),
        };
        assert!(covers(&complete, &keys::course_progress("7")));
        assert!(covers(&complete, &keys::course_progress("8")));
        assert!(covers(&complete, &keys::my_enrollments()));
    }

    #[test]
    fn test_course_changes_invalidate_catalogue() {
        for mutation in [
            Mutation::CreateCourse,
            Mutation::UpdateCourse {
                course_id: "1".to_string(),
            },
            Mutation::DeleteCourse {
                course_id: "1".to_string(),
            },
        ] {
            assert!(covers(&mutation, &keys::courses()));
            assert!(covers(&mutation, &keys::course("1")));
            assert!(!covers(&mutation, &keys::my_enrollments()));
        }
    }

    #[test]
    fn test_notification_reads_stay_local() {
        let read = Mutation::MarkAllNotificationsRead;
        assert!(covers(&read, &keys::notifications()));
        assert!(!covers(&read, &keys::dashboard()));
    }
}
