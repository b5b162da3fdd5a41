//! Campus Applications - session gate and data layer for the Campus client
//!
//! This crate holds everything between the HTTP client and the screens:
//!
//! - **Session** ([`session`]): who is logged in, the boot-time token check,
//!   login/logout and token persistence
//! - **Route guard** ([`auth`]): per-navigation render/redirect decisions
//! - **Query cache** ([`query`]): deduplicated, freshness-aware server reads
//!   and mutation-driven invalidation
//! - **Data** ([`data`], [`progress`]): typed reads and mutations on top of
//!   the cache, and the progress figures derived from them
//! - **App** ([`app`]): the context wiring all of the above, including the
//!   global 401 policy

pub mod app;
pub mod auth;
pub mod data;
pub mod navigation;
pub mod progress;
pub mod query;
pub mod session;

pub use app::{CampusApp, SessionGate};
pub use auth::{after_login, evaluate, home_for, GuardDecision};
pub use data::LearningData;
pub use navigation::{Location, NavigationHistory, Navigator, INDEX_PATH, LOGIN_PATH};
pub use progress::{
    completion_percentage, filter_by_status, merge_overview, sort_overview, CourseOverview,
    CourseStatus, SortOrder,
};
pub use query::{
    query_keys, CacheStats, FetchResult, Mutation, QueryCache, QueryKey, QuerySnapshot,
    DEFAULT_STALE_TIME,
};
pub use session::{FileTokenStore, LoadingState, MemoryTokenStore, Session, SessionStore};

use campus_core::CampusError;
use std::sync::Arc;

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Core(#[from] CampusError),

    /// A cached read failed; the error is shared with every waiter
    #[error(transparent)]
    Fetch(Arc<CampusError>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

impl ApplicationError {
    /// The underlying client error, if this came from the backend
    pub fn campus_error(&self) -> Option<&CampusError> {
        match self {
            ApplicationError::Core(error) => Some(error),
            ApplicationError::Fetch(error) => Some(error.as_ref()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.campus_error().is_some_and(CampusError::is_unauthorized)
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self.campus_error() {
            Some(error) => error.user_message(),
            None => self.to_string(),
        }
    }
}
