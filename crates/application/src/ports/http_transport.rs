//! HTTP transport port
//!
//! The session layer never talks to the network directly; it hands
//! [`ApiRequest`] values to an implementation of this trait.

use std::future::Future;
use std::pin::Pin;

use agenda_domain::{ApiRequest, ApiResponse};

/// Errors raised when a request never produced an HTTP response.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete in time.
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The host refused the connection.
    #[error("Connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Any other connection-level failure.
    #[error("Unable to reach the server: {0}")]
    ConnectionFailed(String),

    /// The response body could not be read.
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + Send + 'a>>;

/// Port for executing HTTP requests.
///
/// Any status code, including 4xx and 5xx, is a successful transport
/// outcome; interpreting it is the caller's job.
pub trait HttpTransport: Send + Sync {
    /// Executes a request and returns the raw response.
    fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}
