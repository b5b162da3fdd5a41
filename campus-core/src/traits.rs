//! Core trait definitions
//!
//! Ports between the session layer and the outside world: where the token
//! lives, and how identity is exchanged with the backend.

use crate::error::CampusResult;
use crate::types::*;
use async_trait::async_trait;

/// Durable storage for the single bearer token.
///
/// Implementations must make `remove` idempotent.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> CampusResult<Option<AccessToken>>;

    fn set(&self, token: &AccessToken) -> CampusResult<()>;

    fn remove(&self) -> CampusResult<()>;
}

/// Identity endpoints the session store depends on
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token and identity
    async fn login(&self, credentials: &Credentials) -> CampusResult<LoginResponse>;

    /// Validate the persisted token and return who it belongs to
    async fn current_user(&self) -> CampusResult<User>;

    /// Invalidate the server-side session
    async fn logout(&self) -> CampusResult<()>;
}
