//! Client configuration: where the API lives and where state is persisted.
//!
//! Resolution order, lowest to highest precedence:
//!
//! 1. Defaults (`http://localhost:8080`, `~/.config/fishon`)
//! 2. Environment (`FISHON_API_ORIGIN`, `FISHON_HOME`)
//! 3. Explicit overrides (`with_api_origin`, `with_storage_dir`)

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::paths;

pub const DEFAULT_API_ORIGIN: &str = "http://localhost:8080";
pub const API_ORIGIN_ENV: &str = "FISHON_API_ORIGIN";
pub const HOME_ENV: &str = "FISHON_HOME";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot locate a storage directory ({0}); set FISHON_HOME")]
    NoStorageDir(String),

    #[error("Invalid API origin '{0}': expected http:// or https://")]
    InvalidOrigin(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port of the FishOn server, without the `/api` prefix.
    pub api_origin: String,
    /// Directory holding `storage.json`.
    pub storage_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(api_origin: impl Into<String>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_origin: api_origin.into(),
            storage_dir: storage_dir.into(),
        }
    }

    /// Defaults overlaid with the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_origin = non_empty_var(API_ORIGIN_ENV)
            .unwrap_or_else(|| DEFAULT_API_ORIGIN.to_string());
        let storage_dir = match non_empty_var(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => paths::default_storage_dir().map_err(ConfigError::NoStorageDir)?,
        };
        Ok(Self::new(api_origin, storage_dir))
    }

    pub fn with_api_origin(mut self, origin: impl Into<String>) -> Self {
        self.api_origin = origin.into();
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Reject origins the HTTP client could never reach.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = self.api_origin.trim();
        if origin.starts_with("http://") || origin.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidOrigin(self.api_origin.clone()))
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
