//! The single error shape returned by every gateway call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failed API call.
///
/// `status` is `None` when no response was received (connection refused,
/// DNS failure, reset, or a request that could not be built). Whenever a
/// response arrived it carries that response's HTTP status, even if the
/// body was unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: Option<u16>,
}

/// Error body convention used by the FishOn API: `{ "message": "..." }`.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    /// Error for a request that never got a response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Error for a request that could not be built, so was never sent.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Error for a response that arrived with the given status.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Build an error from a non-success response.
    ///
    /// Uses the body's `message` field when it is a non-empty string, otherwise
    /// falls back to a generic status message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {}", status));
        Self::with_status(status, message)
    }

    /// True when the server rejected the credential (401/403).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }
}

// ============================================================================
// TESTS
// ============================================================================
