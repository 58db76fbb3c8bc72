//! Application error types

use std::collections::BTreeMap;

use agenda_domain::DomainError;
use thiserror::Error;

use crate::ports::{StorageError, TransportError};

/// Errors surfaced by the session layer and the API gateway.
///
/// The `Display` output is the user-facing message. The type is `Clone`
/// so a single failure can be handed to every waiter of a shared
/// in-flight operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server could not be reached.
    #[error("{0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Server message, or `HTTP <status>` when none could be extracted.
        message: String,
        /// Per-field validation messages from the error body.
        fields: BTreeMap<String, Vec<String>>,
    },

    /// A success body could not be decoded into the expected type.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A request payload could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// Durable token storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// No credentials are stored.
    #[error("No authentication tokens found")]
    NotAuthenticated,

    /// A domain validation error occurred.
    #[error("{0}")]
    Domain(#[from] DomainError),
}

impl ApiError {
    /// Creates an HTTP error without field details.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Returns the HTTP status, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for authorization failures (HTTP 401 or missing tokens).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. } | Self::NotAuthenticated)
    }
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Encode(error.to_string())
    }
}

/// Result type alias for gateway operations.
pub type ApiResult<T> = Result<T, ApiError>;
