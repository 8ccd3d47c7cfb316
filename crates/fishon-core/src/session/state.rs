//! The tri-state view of "who is logged in".

use serde::{Deserialize, Serialize};

use crate::models::Identity;

/// Current session state.
///
/// Serialized as `{"status": "unknown"}`, `{"status": "anonymous"}` or
/// `{"status": "authenticated", "user": {...}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionState {
    /// `initialize()` has not finished yet. Route guards must wait.
    #[default]
    Unknown,
    Authenticated {
        user: Identity,
    },
    Anonymous,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, SessionState::Anonymous)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Unknown)
    }
}
