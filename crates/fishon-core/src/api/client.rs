//! Outbound HTTP plumbing for the FishOn API.
//!
//! Every request goes through [`ApiClient::send`], which is the one place
//! where transport errors and non-success statuses are turned into
//! [`ApiError`].

use std::fmt;
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;

/// Path prefix appended to the configured origin.
pub const API_PREFIX: &str = "/api";

/// HTTP methods used by the FishOn API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway to the remote FishOn REST API.
///
/// Holds the single shared credential. The credential is read when a request
/// is built, so attaching or detaching never affects a request that is
/// already in flight.
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
    credential: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client for the given origin (e.g. `http://localhost:8080`).
    pub fn new(origin: &str) -> Self {
        Self {
            base_url: format!("{}{}", origin.trim_end_matches('/'), API_PREFIX),
            agent: ureq::AgentBuilder::new().build(),
            credential: RwLock::new(None),
        }
    }

    /// Base address every path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach the bearer token used by all subsequent calls.
    pub fn attach_credential(&self, token: impl Into<String>) {
        let mut guard = self.credential.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.into());
    }

    /// Stop sending a bearer token.
    pub fn detach_credential(&self) {
        let mut guard = self.credential.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    /// The currently attached token, if any.
    pub fn credential(&self) -> Option<String> {
        self.credential
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn has_credential(&self) -> bool {
        self.credential
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Perform a request and return the parsed JSON body.
    ///
    /// The blocking transport runs on tokio's blocking pool so the caller only
    /// suspends. Empty success bodies come back as `Value::Null`.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        Ok(self.send_reply(method, path, body).await?.body)
    }

    /// Like [`send`](Self::send), keeping the success status so callers that
    /// interpret the body can report it alongside decode failures.
    pub(crate) async fn send_reply(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Reply, ApiError> {
        let url = self.url(path);
        let token = self.credential();
        let agent = self.agent.clone();

        log::debug!(
            "{} {} (auth: {})",
            method,
            url,
            if token.is_some() { "bearer" } else { "none" }
        );

        tokio::task::spawn_blocking(move || {
            execute(&agent, method, &url, token.as_deref(), body.as_ref())
        })
        .await
        .map_err(|e| ApiError::transport(format!("Request task failed: {}", e)))?
    }

    /// Like [`send`](Self::send), decoding the body into `T`.
    pub(crate) async fn send_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let Reply { status, body } = self.send_reply(method, path, body).await?;
        serde_json::from_value(body).map_err(|e| {
            ApiError::with_status(status, format!("Unexpected response from {}: {}", path, e))
        })
    }
}

/// A successful response: its status and parsed body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Reply {
    pub status: u16,
    pub body: Value,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself.
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_credential", &self.has_credential())
            .finish()
    }
}

fn execute(
    agent: &ureq::Agent,
    method: Method,
    url: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> Result<Reply, ApiError> {
    let mut request = agent
        .request(method.as_str(), url)
        .set("Content-Type", "application/json")
        .set("Accept", "application/json");
    if let Some(token) = token {
        request = request.set("Authorization", &format!("Bearer {}", token));
    }

    let result = match body {
        Some(body) => request.send_json(body),
        None => request.call(),
    };

    match result {
        Ok(response) => {
            let status = response.status();
            let text = response.into_string().map_err(|e| {
                ApiError::with_status(status, format!("Failed to read response: {}", e))
            })?;
            let body = parse_body(status, &text)?;
            Ok(Reply { status, body })
        }
        Err(ureq::Error::Status(status, response)) => {
            let text = response.into_string().unwrap_or_default();
            let err = ApiError::from_response(status, &text);
            log::debug!("{} {} failed with status {}", method, url, status);
            Err(err)
        }
        Err(ureq::Error::Transport(transport)) => {
            log::debug!("{} {} got no response: {}", method, url, transport);
            Err(ApiError::transport(format!("Network error: {}", transport)))
        }
    }
}

fn parse_body(status: u16, text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text)
        .map_err(|e| ApiError::with_status(status, format!("Invalid JSON in response: {}", e)))
}

// ============================================================================
// TESTS
// ============================================================================
