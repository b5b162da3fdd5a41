//! Session Management Module
//!
//! The session store, its state types and the token storage port
//! implementations.

pub mod storage;
pub mod store;
pub mod types;

pub use storage::{FileTokenStore, MemoryTokenStore};
pub use store::SessionStore;
pub use types::*;
