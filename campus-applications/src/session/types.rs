//! Session state types

use campus_core::{Role, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the boot-time token check has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadingState {
    /// The persisted token is being validated; no redirect decisions yet
    Checking,
    /// Identity is known (possibly absent)
    Ready,
}

/// Who is logged in, as seen by every screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Option<User>,
    pub loading: LoadingState,
    /// When the identity was last set from the backend
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// State before `initialize` has run
    pub fn checking() -> Self {
        Self {
            identity: None,
            loading: LoadingState::Checking,
            authenticated_at: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.loading == LoadingState::Ready
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|user| user.role)
    }

    /// Short description for logs; never includes credentials
    pub fn summary(&self) -> String {
        match &self.identity {
            Some(user) => format!("Session[user={}({}), {:?}]", user.id, user.role, self.loading),
            None => format!("Session[anonymous, {:?}]", self.loading),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::checking()
    }
}
