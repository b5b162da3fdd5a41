//! Application context
//!
//! Wires the session store, the HTTP client, the query cache and the
//! navigator together, and installs the global 401 policy on the client.

use crate::auth::{after_login, evaluate, GuardDecision};
use crate::data::LearningData;
use crate::navigation::{Location, Navigator};
use crate::query::QueryCache;
use crate::session::{FileTokenStore, Session, SessionStore};
use crate::ApplicationResult;
use campus_client::{
    ApiClient, AuthFailure, BackendApi, HttpTransport, ReqwestTransport, UnauthorizedHandler,
};
use campus_core::{
    performance, validation_error, AuthBackend, CampusConfig, Credentials, Role, TokenStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Reaction to a 401 from any endpoint: tear the session down, forget every
/// cached read, and send the visitor to the login screen.
///
/// While the boot check is still running only the teardown happens; the
/// guard makes the redirect once the session is ready.
pub struct SessionGate {
    session: SessionStore,
    cache: QueryCache,
    navigator: Arc<dyn Navigator>,
}

impl SessionGate {
    pub fn new(session: SessionStore, cache: QueryCache, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            session,
            cache,
            navigator,
        }
    }
}

impl UnauthorizedHandler for SessionGate {
    fn on_unauthorized(&self, failure: &AuthFailure) {
        let was_authenticated = self.session.teardown();
        self.cache.clear();

        if !self.session.current().is_ready() {
            debug!(path = %failure.path, "401 during boot check, no redirect");
            return;
        }

        let current = self.navigator.current();
        if current.as_ref().is_some_and(Location::is_login) {
            return;
        }

        warn!(
            method = %failure.method,
            path = %failure.path,
            was_authenticated,
            "Backend rejected credentials, forcing logout"
        );
        self.navigator.navigate(Location::login(current.as_ref()));
    }
}

pub struct CampusApp {
    session: SessionStore,
    api: BackendApi,
    cache: QueryCache,
    navigator: Arc<dyn Navigator>,
    data: LearningData,
}

impl CampusApp {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        stale_time: Duration,
    ) -> Self {
        let session = SessionStore::new(Arc::clone(&tokens));
        let cache = QueryCache::new(stale_time);
        let gate = SessionGate::new(session.clone(), cache.clone(), Arc::clone(&navigator));
        let client = ApiClient::new(transport, tokens).with_unauthorized_handler(Arc::new(gate));
        let api = BackendApi::new(client);
        let data = LearningData::new(api.clone(), cache.clone(), session.clone());

        Self {
            session,
            api,
            cache,
            navigator,
            data,
        }
    }

    /// HTTP transport and token file as configured
    pub fn from_config(
        config: &CampusConfig,
        navigator: Arc<dyn Navigator>,
    ) -> ApplicationResult<Self> {
        let transport = ReqwestTransport::new(&config.api)?;
        let tokens = FileTokenStore::new(config.storage.token_path()?);
        Ok(Self::new(
            Arc::new(transport),
            Arc::new(tokens),
            navigator,
            Duration::from_secs(config.cache.stale_time_secs),
        ))
    }

    /// Run the one-time token check. Screens evaluated before this finishes
    /// get [`GuardDecision::Loading`].
    pub async fn boot(&self) -> Session {
        let session =
            performance::measure_async("boot_check", self.session.initialize(&self.api.auth)).await;
        info!(session = %session.summary(), "Boot check finished");
        session
    }

    /// Wait until the boot check has produced an answer
    pub async fn ready(&self) -> Session {
        let mut receiver = self.session.subscribe();
        let session = match receiver.wait_for(Session::is_ready).await {
            Ok(session) => session.clone(),
            Err(_) => self.session.current(),
        };
        session
    }

    /// Exchange credentials for a session and go where the visitor was
    /// headed, or to the role's home.
    pub async fn sign_in(&self, email: &str, password: &str) -> ApplicationResult<Location> {
        if email.trim().is_empty() {
            return Err(validation_error!("Email is required", "email", "sign_in").into());
        }
        if password.is_empty() {
            return Err(validation_error!("Password is required", "password", "sign_in").into());
        }

        let response = self
            .api
            .auth
            .login(&Credentials::new(email.trim(), password))
            .await?;

        self.cache.clear();
        self.session
            .login(response.user.clone(), &response.access_token)?;

        let return_to = self
            .navigator
            .current()
            .filter(Location::is_login)
            .and_then(|location| location.return_to);
        let target = after_login(&response.user, return_to.as_deref());
        self.navigator.navigate(target.clone());
        Ok(target)
    }

    pub async fn sign_out(&self) {
        self.session.logout(&self.api.auth).await;
        self.cache.clear();
        self.navigator.navigate(Location::login(None));
    }

    /// Run the guard for a navigation and carry out its decision
    pub fn navigate(&self, location: Location, required_roles: Option<&[Role]>) -> GuardDecision {
        let decision = evaluate(&self.session.current(), &location, required_roles);
        match &decision {
            GuardDecision::Render => self.navigator.navigate(location),
            GuardDecision::RedirectToLogin { location: target }
            | GuardDecision::RedirectHome { location: target } => {
                debug!(requested = %location, to = %target, "Guard redirect");
                self.navigator.navigate(target.clone());
            }
            GuardDecision::Loading => debug!(requested = %location, "Session not ready yet"),
        }
        decision
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn data(&self) -> &LearningData {
        &self.data
    }

    pub fn api(&self) -> &BackendApi {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }
}
