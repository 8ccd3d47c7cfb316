use fishon_core::config::ConfigError;
use fishon_core::{ApiError, ContextError, SessionError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}
