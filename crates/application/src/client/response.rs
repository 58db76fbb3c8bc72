//! Response normalization
//!
//! Turns raw [`ApiResponse`] values into typed results or [`ApiError`]s.

use agenda_domain::{ApiErrorBody, ApiResponse, ErrorMessage};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Passes success responses through and converts the rest into errors.
pub(super) fn check(response: ApiResponse) -> ApiResult<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(error_from(&response))
    }
}

/// Builds the error for a non-success response.
///
/// The message comes from the JSON body's `message` field (lists joined
/// with `", "`), or is `HTTP <status>` when the body carries none.
pub(super) fn error_from(response: &ApiResponse) -> ApiError {
    let status = response.status.as_u16();
    let fallback = || format!("HTTP {status}");

    match serde_json::from_slice::<ApiErrorBody>(&response.body) {
        Ok(body) => ApiError::Http {
            status,
            message: body
                .message
                .as_ref()
                .and_then(ErrorMessage::to_text)
                .unwrap_or_else(fallback),
            fields: body.fields.unwrap_or_default(),
        },
        Err(_) => ApiError::http(status, fallback()),
    }
}

/// Decodes a success body.
///
/// Non-JSON or empty bodies decode as JSON `null`, which satisfies `()`
/// and `Option<_>` targets.
pub(super) fn decode<T: DeserializeOwned>(response: &ApiResponse) -> ApiResult<T> {
    let has_body = !response.body.iter().all(u8::is_ascii_whitespace);

    let decoded = if response.is_json() && has_body {
        serde_json::from_slice(&response.body)
    } else {
        T::deserialize(Value::Null)
    };
    decoded.map_err(|e| ApiError::Decode(e.to_string()))
}
