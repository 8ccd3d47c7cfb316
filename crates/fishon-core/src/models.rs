//! Types owned by the core: the logged-in identity and the auth payloads.
//!
//! Posts and comments are deliberately absent; they travel through the
//! gateway as `serde_json::Value`.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::api::ApiError;

/// The authenticated user as reported by the server.
///
/// Only `userName` is required. Fields the core does not know about are kept
/// in `extra` so front ends can still read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            email: None,
            first_name: None,
            last_name: None,
            age: None,
            profile_picture: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    /// "First Last", falling back to the user name.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            self.user_name.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`) and zone-less ISO timestamps
/// (`2024-05-01T10:00:00.123`), the latter read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .map(|naive| naive.and_utc())
}

// Unreadable timestamps are dropped rather than failing the whole identity.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

/// Login form. The identifier goes over the wire as `email`; the server
/// accepts either an email address or a user name there.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
    #[serde(rename = "email")]
    pub identifier: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration form as typed by the user. `age` is raw text.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub user_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: String,
    pub password: String,
    pub profile_picture: String,
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("user_name", &self.user_name)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("age", &self.age)
            .field("password", &"<redacted>")
            .field("profile_picture", &self.profile_picture)
            .finish()
    }
}

/// Wire body for `POST /auth/register`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegistrationPayload<'a> {
    user_name: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    age: Option<i64>,
    password: &'a str,
    profile_picture: &'a str,
}

impl RegistrationForm {
    /// The credentials used for the implicit login after registration.
    pub fn credentials(&self) -> LoginCredentials {
        LoginCredentials::new(self.email.clone(), self.password.clone())
    }

    pub(crate) fn payload(&self) -> RegistrationPayload<'_> {
        RegistrationPayload {
            user_name: &self.user_name,
            email: &self.email,
            first_name: &self.first_name,
            last_name: &self.last_name,
            age: parse_age(&self.age),
            password: &self.password,
            profile_picture: &self.profile_picture,
        }
    }
}

/// Read the leading integer of user input: `" 42 years"` -> 42, `"12.9"` -> 12.
/// Returns `None` when the text does not start with a number.
pub fn parse_age(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Result of `POST /auth/login`: the bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub identity: Identity,
}

impl LoginResponse {
    /// Extract token and identity from a login body.
    ///
    /// The identity is the `user` object when the server nests it, otherwise
    /// the body itself minus the token. `status` is the status the body
    /// arrived with and is reported on every rejection.
    pub fn from_value(status: u16, body: Value) -> Result<Self, ApiError> {
        let Value::Object(mut fields) = body else {
            return Err(ApiError::with_status(
                status,
                "Login response is not a JSON object",
            ));
        };

        let token = match fields.remove("token") {
            Some(Value::String(token)) if !token.is_empty() => token,
            _ => {
                return Err(ApiError::with_status(
                    status,
                    "Login response did not include a token",
                ))
            }
        };

        let user = match fields.remove("user") {
            Some(user @ Value::Object(_)) => user,
            _ => Value::Object(fields),
        };
        let identity = serde_json::from_value(user).map_err(|e| {
            ApiError::with_status(status, format!("Login response has no usable user: {}", e))
        })?;

        Ok(Self { token, identity })
    }
}

// ============================================================================
// TESTS
// ============================================================================
