//! Session management.
//!
//! - `state` - the tri-state [`SessionState`]
//! - `store` - [`SessionStore`], which owns the state and the credential lifecycle

pub mod state;
pub mod store;

pub use state::SessionState;
pub use store::{SessionError, SessionStore};
