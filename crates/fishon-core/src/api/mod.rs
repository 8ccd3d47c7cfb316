//! API Gateway Client: the only component allowed to perform network calls.
//!
//! - `client` - request building, credential handling, error normalization
//! - `endpoints` - one method per remote resource
//! - `error` - the normalized [`ApiError`]

mod client;
mod endpoints;
mod error;

pub use client::{ApiClient, Method, API_PREFIX};
pub use error::ApiError;
