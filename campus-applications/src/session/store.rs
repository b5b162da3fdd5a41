//! Session Store - single source of truth for "who is logged in"
//!
//! State lives in a `watch` channel: the store is the only writer, and every
//! consumer either takes a snapshot with [`SessionStore::current`] or keeps a
//! receiver from [`SessionStore::subscribe`] to see changes immediately.

use super::{LoadingState, Session};
use campus_core::{AccessToken, AuthBackend, CampusResult, TokenStore, User};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<Session>>,
    tokens: Arc<dyn TokenStore>,
    initialized: Arc<AtomicBool>,
}

impl SessionStore {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(Session::checking());
        Self {
            state: Arc::new(state),
            tokens,
            initialized: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that observes every identity and loading change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Validate the persisted token once at application start.
    ///
    /// Fails open: any problem validating the token (rejection, server
    /// error, network failure, unreadable storage) ends in a ready session
    /// with no identity and the token removed. Later calls do nothing.
    pub async fn initialize(&self, backend: &dyn AuthBackend) -> Session {
        if self.initialized.swap(true, Ordering::SeqCst) {
            warn!("Session store already initialized, ignoring repeated call");
            return self.current();
        }

        let token = match self.tokens.get() {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(e) => {
                warn!(error = %e, "Could not read persisted credential, starting logged out");
                self.discard_token();
                None
            }
        };

        if token.is_none() {
            debug!("No persisted credential, skipping validation");
            self.publish(|session| {
                session.identity = None;
                session.authenticated_at = None;
                session.loading = LoadingState::Ready;
            });
            return self.current();
        }

        match backend.current_user().await {
            Ok(user) => {
                info!(user_id = %user.id, role = %user.role, "Restored session from persisted credential");
                self.publish(|session| {
                    session.identity = Some(user);
                    session.authenticated_at = Some(Utc::now());
                    session.loading = LoadingState::Ready;
                });
            }
            Err(e) => {
                info!(error = %e, "Persisted credential rejected, starting logged out");
                self.discard_token();
                self.publish(|session| {
                    session.identity = None;
                    session.authenticated_at = None;
                    session.loading = LoadingState::Ready;
                });
            }
        }

        self.current()
    }

    /// Record a successful credential exchange
    pub fn login(&self, user: User, token: &AccessToken) -> CampusResult<()> {
        self.tokens.set(token)?;
        info!(user_id = %user.id, role = %user.role, "Logged in");
        self.publish(|session| {
            session.identity = Some(user);
            session.authenticated_at = Some(Utc::now());
        });
        Ok(())
    }

    /// Log out. The backend is told on a best-effort basis; local state is
    /// cleared regardless of whether that call succeeds.
    pub async fn logout(&self, backend: &dyn AuthBackend) {
        let has_token = matches!(self.tokens.get(), Ok(Some(_)));
        if has_token {
            if let Err(e) = backend.logout().await {
                debug!(error = %e, "Server-side logout failed, clearing local session anyway");
            }
        }

        self.teardown();
        info!("Logged out");
    }

    /// Drop the token and identity without any network I/O. Loading state is
    /// left as it is. Returns whether someone was logged in.
    pub fn teardown(&self) -> bool {
        self.discard_token();

        let mut was_authenticated = false;
        self.publish(|session| {
            was_authenticated = session.identity.take().is_some();
            session.authenticated_at = None;
        });
        was_authenticated
    }

    /// Replace the identity after a profile change. Ignored when logged out.
    pub fn update_identity(&self, user: User) {
        self.publish(|session| {
            if session.identity.is_some() {
                session.identity = Some(user);
            }
        });
    }

    fn discard_token(&self) {
        if let Err(e) = self.tokens.remove() {
            warn!(error = %e, "Failed to remove persisted credential");
        }
    }

    fn publish(&self, modify: impl FnOnce(&mut Session)) {
        self.state.send_modify(modify);
        debug!(session = %self.state.borrow().summary(), "Session updated");
    }
}
