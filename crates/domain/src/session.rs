//! Session token types

use serde::{Deserialize, Serialize};

/// The access/refresh credential pair held by the client.
///
/// Either both tokens are absent (signed out) or at least the refresh
/// token is present, in which case the session can still be recovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived credential attached to authenticated requests.
    pub access_token: Option<String>,
    /// Longer-lived credential exchanged for a new pair on expiry.
    pub refresh_token: Option<String>,
}

impl TokenPair {
    /// Creates a pair with both tokens set.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Returns true if neither token is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }

    /// Returns the session state implied by the stored tokens.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        match (&self.access_token, &self.refresh_token) {
            (Some(_), _) => SessionState::Active,
            (None, Some(_)) => SessionState::Degraded,
            (None, None) => SessionState::SignedOut,
        }
    }
}

/// Coarse authentication state derived from a [`TokenPair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No tokens are stored.
    SignedOut,
    /// Only the refresh token is stored; the next request will refresh.
    Degraded,
    /// An access token is stored.
    Active,
}

impl SessionState {
    /// Returns true if some credential is stored.
    #[must_use]
    pub const fn has_credentials(self) -> bool {
        !matches!(self, Self::SignedOut)
    }

    /// Returns a user-friendly message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SignedOut => "Not authenticated",
            Self::Degraded => "Session expired (can refresh)",
            Self::Active => "Authenticated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_session_state_from_tokens() {
        assert_eq!(TokenPair::default().state(), SessionState::SignedOut);
        assert_eq!(TokenPair::new("a", "r").state(), SessionState::Active);

        let degraded = TokenPair {
            access_token: None,
            refresh_token: Some("r".to_string()),
        };
        assert_eq!(degraded.state(), SessionState::Degraded);
        assert!(degraded.state().has_credentials());
        assert!(!SessionState::SignedOut.has_credentials());
    }

    #[test]
    fn test_token_pair_wire_names() {
        let json = serde_json::to_value(TokenPair::new("a", "r")).unwrap_or_default();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
    }
}
