//! Campus Core - shared types, errors, configuration and logging
//!
//! Everything the session gate and the data layer agree on lives here: the
//! domain records returned by the backend, the error taxonomy, and the ports
//! (`TokenStore`, `AuthBackend`) the upper layers are written against.

pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
