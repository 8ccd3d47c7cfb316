//! # fishon-core
//!
//! Client-side core for FishOn, the fishing-catch sharing app.
//!
//! This crate is framework-agnostic and can be used by:
//! - the `fishon` command-line client
//! - any other front end that needs a logged-in view of the FishOn API
//!
//! ## Key Concepts
//!
//! - **ApiClient**: the only component that talks to the network; attaches the
//!   bearer credential and normalizes every failure into [`ApiError`]
//! - **SessionStore**: who is logged in, plus the token lifecycle
//!   (initialize, login, register, logout)
//! - **FishOnContext**: the container that owns both and is handed to every
//!   consumer instead of global state

pub mod api;
pub mod config;
pub mod context;
pub mod event_bus;
pub mod models;
pub mod paths;
pub mod persistence;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use context::{ContextError, FishOnContext, FishOnContextBuilder};
pub use models::{Identity, LoginCredentials, RegistrationForm};
pub use session::{SessionError, SessionState, SessionStore};
