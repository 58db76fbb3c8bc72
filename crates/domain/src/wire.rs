//! Request and response bodies of the auth and health endpoints

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::session::TokenPair;
use crate::user::User;

/// Response of `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The signed-in user.
    pub user: User,
    /// Fresh access token.
    pub access_token: String,
    /// Fresh refresh token.
    pub refresh_token: String,
}

impl AuthResponse {
    /// Returns the issued token pair.
    #[must_use]
    pub fn tokens(&self) -> TokenPair {
        TokenPair::new(&self.access_token, &self.refresh_token)
    }
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token to exchange.
    pub refresh_token: String,
}

/// Response of `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// Rotated access token.
    pub access_token: String,
    /// Rotated refresh token.
    pub refresh_token: String,
}

/// Body of `POST /auth/logout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    /// Refresh token to revoke server-side, if one is stored.
    pub refresh_token: Option<String>,
}

/// Generic `{message}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status string.
    pub status: String,
    /// Database connectivity status.
    pub database: String,
    /// Server time of the check.
    pub timestamp: DateTime<Utc>,
    /// Server uptime in seconds.
    pub uptime: f64,
}

/// The `message` field of an error body: one string or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    /// Single message.
    One(String),
    /// Several validation messages.
    Many(Vec<Value>),
    /// Anything else the server put there.
    Other(Value),
}

impl ErrorMessage {
    /// Renders the message as one line, joining lists with `", "`.
    ///
    /// Returns `None` when there is nothing to show.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        let text = match self {
            Self::One(message) => message.clone(),
            Self::Many(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Self::Other(Value::Null) => String::new(),
            Self::Other(other) => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Error body returned by the backend on non-success statuses.
///
/// Every member is optional and decoded on its own: a member with an
/// unexpected shape reads as absent instead of failing the whole body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiErrorBody {
    /// Echo of the HTTP status.
    #[serde(deserialize_with = "lenient")]
    pub status_code: Option<u16>,
    /// Message or list of messages.
    #[serde(deserialize_with = "lenient")]
    pub message: Option<ErrorMessage>,
    /// Short error label (e.g. "Bad Request").
    #[serde(deserialize_with = "lenient")]
    pub error: Option<String>,
    /// Per-field validation messages.
    #[serde(deserialize_with = "lenient")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
