//! Endpoint catalogue of the FishOn API.
//!
//! Each method is a pass-through: it forwards the payload and returns the
//! response without interpreting resource-specific fields. Only the auth
//! endpoints decode into core types.

use std::fmt::Display;

use serde_json::{json, Value};

use super::client::{ApiClient, Method};
use super::error::ApiError;
use crate::models::{Identity, LoginCredentials, LoginResponse, RegistrationForm};

/// Percent-encode a caller-supplied path segment.
fn segment(value: impl Display) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}

impl ApiClient {
    // ========================================================================
    // Auth
    // ========================================================================

    /// `POST /auth/register`. Does not establish a session.
    pub async fn register(&self, form: &RegistrationForm) -> Result<Value, ApiError> {
        let payload = serde_json::to_value(form.payload())
            .map_err(|e| ApiError::invalid_request(format!("Invalid registration payload: {}", e)))?;
        self.send(Method::Post, "/auth/register", Some(payload)).await
    }

    /// `POST /auth/login`. Does not attach the returned token; that is the
    /// session store's job.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ApiError> {
        let payload = serde_json::to_value(credentials)
            .map_err(|e| ApiError::invalid_request(format!("Invalid login payload: {}", e)))?;
        let reply = self.send_reply(Method::Post, "/auth/login", Some(payload)).await?;
        LoginResponse::from_value(reply.status, reply.body)
    }

    /// `GET /auth/me`.
    pub async fn current_user(&self) -> Result<Identity, ApiError> {
        self.send_as(Method::Get, "/auth/me", None).await
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// `GET /users/{userName}`.
    pub async fn user_profile(&self, user_name: &str) -> Result<Value, ApiError> {
        let path = format!("/users/{}", segment(user_name));
        self.send(Method::Get, &path, None).await
    }

    /// `PUT /users/profile`. The server answers with the updated user.
    pub async fn update_profile(&self, changes: &Value) -> Result<Identity, ApiError> {
        self.send_as(Method::Put, "/users/profile", Some(changes.clone()))
            .await
    }

    // ========================================================================
    // Posts
    // ========================================================================

    /// `GET /posts`.
    pub async fn feed(&self) -> Result<Value, ApiError> {
        self.send(Method::Get, "/posts", None).await
    }

    /// `GET /posts/user/{userName}`.
    pub async fn user_posts(&self, user_name: &str) -> Result<Value, ApiError> {
        let path = format!("/posts/user/{}", segment(user_name));
        self.send(Method::Get, &path, None).await
    }

    /// `POST /posts`.
    pub async fn create_post(&self, post: &Value) -> Result<Value, ApiError> {
        self.send(Method::Post, "/posts", Some(post.clone())).await
    }

    /// `PUT /posts/{id}`.
    pub async fn update_post(&self, post_id: impl Display, post: &Value) -> Result<Value, ApiError> {
        let path = format!("/posts/{}", segment(post_id));
        self.send(Method::Put, &path, Some(post.clone())).await
    }

    /// `DELETE /posts/{id}`.
    pub async fn delete_post(&self, post_id: impl Display) -> Result<Value, ApiError> {
        let path = format!("/posts/{}", segment(post_id));
        self.send(Method::Delete, &path, None).await
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// `POST /posts/{id}/comments` with `{"content": ...}`.
    pub async fn create_comment(
        &self,
        post_id: impl Display,
        content: &str,
    ) -> Result<Value, ApiError> {
        let path = format!("/posts/{}/comments", segment(post_id));
        self.send(Method::Post, &path, Some(json!({ "content": content })))
            .await
    }

    /// `PUT /comments/{id}` with `{"content": ...}`.
    pub async fn update_comment(
        &self,
        comment_id: impl Display,
        content: &str,
    ) -> Result<Value, ApiError> {
        let path = format!("/comments/{}", segment(comment_id));
        self.send(Method::Put, &path, Some(json!({ "content": content })))
            .await
    }

    /// `DELETE /comments/{id}`.
    pub async fn delete_comment(&self, comment_id: impl Display) -> Result<Value, ApiError> {
        let path = format!("/comments/{}", segment(comment_id));
        self.send(Method::Delete, &path, None).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
