//! HTTP Request body types

/// Body of an outgoing API request.
///
/// JSON bodies are pre-serialized so the request value stays cheap to clone
/// when the pipeline replays it after a token refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// Serialized JSON document
    Json(String),
    /// Opaque bytes (file upload, multipart payload). The caller owns the
    /// `Content-Type` header for these.
    Binary(Vec<u8>),
}

impl RequestBody {
    /// Returns whether the body carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Json(content) => content.is_empty(),
            Self::Binary(bytes) => bytes.is_empty(),
        }
    }

    /// Returns true when the content type is controlled by the caller.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Returns the raw bytes to put on the wire.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::Json(content) => content.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}
