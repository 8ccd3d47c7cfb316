//! SessionStore - the single source of truth for "who is logged in".

use std::sync::{Arc, RwLock};

use serde_json::Value;
use thiserror::Error;

use super::state::SessionState;
use crate::api::{ApiClient, ApiError};
use crate::event_bus::{EventBus, SESSION_CHANGED};
use crate::models::{Identity, LoginCredentials, LoginResponse, RegistrationForm};
use crate::persistence::{LocalStorage, StorageError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to persist credential: {0}")]
    Storage(#[from] StorageError),

    #[error("Not logged in")]
    NotAuthenticated,
}

impl SessionError {
    /// The API error behind this failure, if it came from the server.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Owns the session state and the credential lifecycle.
///
/// The in-memory token (attached to the [`ApiClient`]) and the persisted
/// token are updated together by every mutating operation. Mutations are
/// expected to be issued one at a time; if two race, the last write wins.
pub struct SessionStore {
    api: Arc<ApiClient>,
    storage: LocalStorage,
    events: Arc<EventBus>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new(api: Arc<ApiClient>, storage: LocalStorage, events: Arc<EventBus>) -> Self {
        Self {
            api,
            storage,
            events,
            state: RwLock::new(SessionState::Unknown),
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    // ========================================================================
    // Read accessors
    // ========================================================================

    /// Snapshot of the current state. Never blocks on the network.
    pub fn state(&self) -> SessionState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_loading()
    }

    fn set_state(&self, next: SessionState) {
        {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            if *guard == next {
                return;
            }
            *guard = next.clone();
        }
        self.events.emit(SESSION_CHANGED, &next);
    }

    /// Forget the credential everywhere. Always detaches, even when the
    /// persisted copy cannot be removed.
    fn clear_credential(&self) -> Result<(), StorageError> {
        self.api.detach_credential();
        self.storage.clear_token()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Restore the session from the persisted credential.
    ///
    /// Never fails: an unreadable, expired or unverifiable credential is
    /// dropped and the session continues anonymously.
    pub async fn initialize(&self) {
        self.set_state(SessionState::Unknown);

        let token = match self.storage.load_token() {
            Ok(token) => token,
            Err(e) => {
                log::warn!("Could not read stored credential: {}", e);
                None
            }
        };

        let Some(token) = token else {
            if let Err(e) = self.clear_credential() {
                log::warn!("Could not clear stored credential: {}", e);
            }
            log::info!("No stored credential, starting anonymous");
            self.set_state(SessionState::Anonymous);
            return;
        };

        self.api.attach_credential(token);
        match self.api.current_user().await {
            Ok(user) => {
                log::info!("Restored session for {}", user.user_name);
                self.set_state(SessionState::Authenticated { user });
            }
            Err(e) => {
                if e.is_unauthorized() {
                    log::info!("Stored credential expired, starting anonymous");
                } else {
                    log::warn!("Could not verify stored credential ({}), starting anonymous", e);
                }
                if let Err(e) = self.clear_credential() {
                    log::warn!("Could not clear stored credential: {}", e);
                }
                self.set_state(SessionState::Anonymous);
            }
        }
    }

    /// Log in and establish a session.
    ///
    /// Either both the credential and the identity are set, or neither is; on
    /// failure the previous state is left untouched.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Identity, SessionError> {
        let LoginResponse { token, identity } = self.api.login(credentials).await?;

        self.storage.save_token(&token)?;
        self.api.attach_credential(token);

        log::info!("Logged in as {}", identity.user_name);
        self.set_state(SessionState::Authenticated {
            user: identity.clone(),
        });
        Ok(identity)
    }

    /// Create an account, then log in with the same email and password.
    ///
    /// Returns the user as created by the server. If the implicit login
    /// fails its error is returned; the account still exists server-side.
    pub async fn register(&self, form: &RegistrationForm) -> Result<Value, SessionError> {
        let created = self.api.register(form).await?;
        log::info!("Registered {}", form.user_name);
        self.login(&form.credentials()).await?;
        Ok(created)
    }

    /// End the session. Local only; succeeds regardless of the network.
    ///
    /// The state becomes anonymous even if the persisted credential could not
    /// be removed, in which case the storage error is returned.
    pub fn logout(&self) -> Result<(), SessionError> {
        let cleared = self.clear_credential();
        self.set_state(SessionState::Anonymous);
        log::info!("Logged out");
        cleared.map_err(SessionError::from)
    }

    /// Update the logged-in user's profile and adopt the server's answer.
    pub async fn update_profile(&self, changes: &Value) -> Result<Identity, SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }

        let credential = self.api.credential();
        let user = self.api.update_profile(changes).await?;

        // Only the session that issued the request may adopt the answer; a
        // logout or a login as someone else while in flight wins.
        let applied = {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            if guard.is_authenticated() && self.api.credential() == credential {
                *guard = SessionState::Authenticated { user: user.clone() };
                Some(guard.clone())
            } else {
                None
            }
        };
        if let Some(state) = applied {
            self.events.emit(SESSION_CHANGED, &state);
        }
        Ok(user)
    }

    /// Tear down the in-memory session. The persisted credential is kept so
    /// a later `initialize()` can restore it.
    pub fn dispose(&self) {
        self.api.detach_credential();
        self.set_state(SessionState::Unknown);
    }
}

// ============================================================================
// TESTS
// ============================================================================
