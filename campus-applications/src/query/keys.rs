//! Structured cache keys
//!
//! A key is an ordered list of segments. Invalidation works on prefixes, so
//! `["enrollments"]` covers `["enrollments", "my-courses"]`.

use campus_core::Role;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether `prefix` is this key or an ancestor of it
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }
}

impl<const N: usize> From<[&str; N]> for QueryKey {
    fn from(segments: [&str; N]) -> Self {
        QueryKey::new(segments)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Every key the data layer reads under
pub mod keys {
    use super::*;

    pub fn courses() -> QueryKey {
        QueryKey::from(["courses"])
    }

    pub fn course(course_id: &str) -> QueryKey {
        courses().child(course_id)
    }

    pub fn enrollments() -> QueryKey {
        QueryKey::from(["enrollments"])
    }

    pub fn my_enrollments() -> QueryKey {
        enrollments().child("my-courses")
    }

    pub fn progress() -> QueryKey {
        QueryKey::from(["progress"])
    }

    pub fn course_progress(course_id: &str) -> QueryKey {
        progress().child(course_id)
    }

    pub fn dashboard() -> QueryKey {
        QueryKey::from(["dashboard"])
    }

    pub fn role_dashboard(role: Role) -> QueryKey {
        dashboard().child(role.as_str())
    }

    pub fn notifications() -> QueryKey {
        QueryKey::from(["notifications"])
    }

    pub fn current_user() -> QueryKey {
        QueryKey::from(["auth", "me"])
    }

    pub fn admin() -> QueryKey {
        QueryKey::from(["admin"])
    }

    pub fn admin_users() -> QueryKey {
        admin().child("users")
    }
}
