//! Authentication and Authorization Module
//!
//! Screen-level access control. Who the user is comes from the session
//! store; this module only decides what they may see.

pub mod guard;

pub use guard::{after_login, evaluate, home_for, GuardDecision};
