//! FishOnContext - the container every front end holds instead of globals.
//!
//! It owns the single [`ApiClient`], the [`SessionStore`] built on top of it,
//! and the [`EventBus`] the store publishes to. Front ends receive a reference
//! to the context and never construct these pieces themselves.
//!
//! ## Lifecycle
//!
//! ```text
//!   build() ──▶ initialize().await ──▶ ... operations ... ──▶ dispose()
//!                 (Unknown → Authenticated | Anonymous)         (→ Unknown)
//! ```

use std::sync::Arc;

use thiserror::Error;

use crate::api::ApiClient;
use crate::config::{ClientConfig, ConfigError};
use crate::event_bus::EventBus;
use crate::persistence::LocalStorage;
use crate::session::{SessionState, SessionStore};

#[derive(Error, Debug)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration for building a FishOnContext.
#[derive(Default)]
pub struct FishOnContextBuilder {
    config: Option<ClientConfig>,
    event_bus: Option<Arc<EventBus>>,
    api: Option<Arc<ApiClient>>,
}

impl FishOnContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this configuration instead of reading the environment.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an existing EventBus (for testing or custom configurations).
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Use an existing ApiClient instead of one built from the configured
    /// origin.
    pub fn api(mut self, api: Arc<ApiClient>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn build(self) -> Result<FishOnContext, ContextError> {
        let config = match self.config {
            Some(config) => config,
            None => ClientConfig::from_env()?,
        };
        config.validate()?;

        let event_bus = self.event_bus.unwrap_or_default();
        let api = self
            .api
            .unwrap_or_else(|| Arc::new(ApiClient::new(&config.api_origin)));
        let storage = LocalStorage::new(&config.storage_dir);
        log::debug!(
            "FishOn context ready (api: {}, storage: {})",
            api.base_url(),
            storage.dir().display()
        );
        let session = SessionStore::new(Arc::clone(&api), storage, Arc::clone(&event_bus));

        Ok(FishOnContext {
            config,
            event_bus,
            api,
            session,
        })
    }
}

/// Everything a FishOn front end needs, owned in one place.
pub struct FishOnContext {
    config: ClientConfig,
    event_bus: Arc<EventBus>,
    api: Arc<ApiClient>,
    session: SessionStore,
}

impl FishOnContext {
    pub fn builder() -> FishOnContextBuilder {
        FishOnContextBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Restore the persisted session; see [`SessionStore::initialize`].
    pub async fn initialize(&self) -> SessionState {
        self.session.initialize().await;
        self.session.state()
    }

    /// End the context's validity; see [`SessionStore::dispose`].
    pub fn dispose(self) {
        self.session.dispose();
    }
}
