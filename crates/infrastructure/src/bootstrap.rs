//! Gateway wiring
//!
//! Connects the session core to the reqwest transport and the session
//! file according to [`ClientSettings`].

use std::sync::Arc;

use agenda_application::ports::{HttpTransport, KeyValueStorage, TransportError};
use agenda_application::{AuthGateway, ClientSettings};
use tracing::info;

use crate::adapters::ReqwestTransport;
use crate::persistence::FileTokenStorage;

/// Error type for gateway construction.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The HTTP client could not be created.
    #[error("Failed to create HTTP client: {0}")]
    Transport(#[from] TransportError),

    /// No token file was configured and the platform has no config dir.
    #[error("Could not determine the session file location; set AGENDA_TOKEN_FILE")]
    NoTokenPath,
}

/// Builds a gateway using the reqwest transport.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created or the session
/// file location cannot be determined.
pub fn build_gateway(settings: &ClientSettings) -> Result<AuthGateway, BootstrapError> {
    build_gateway_with(settings, Arc::new(ReqwestTransport::new()?))
}

/// Builds a gateway over the given transport.
///
/// Durable storage is attached only in an interactive context.
///
/// # Errors
///
/// Returns an error if the session file location cannot be determined.
pub fn build_gateway_with(
    settings: &ClientSettings,
    transport: Arc<dyn HttpTransport>,
) -> Result<AuthGateway, BootstrapError> {
    let storage: Option<Arc<dyn KeyValueStorage>> = if settings.context.has_storage() {
        let path = settings
            .token_file
            .clone()
            .or_else(FileTokenStorage::default_path)
            .ok_or(BootstrapError::NoTokenPath)?;
        info!(path = %path.display(), "using session file");
        let storage: Arc<dyn KeyValueStorage> = Arc::new(FileTokenStorage::new(path));
        Some(storage)
    } else {
        info!("headless context, tokens are not persisted");
        None
    };

    Ok(AuthGateway::with_settings(settings, transport, storage))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use agenda_application::ExecutionContext;
    use agenda_domain::{SessionState, TokenPair};
    use tempfile::TempDir;

    #[test]
    fn test_interactive_gateway_uses_session_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let settings = ClientSettings {
            token_file: Some(path.clone()),
            ..ClientSettings::default()
        };

        let gateway = build_gateway(&settings).unwrap();
        gateway
            .client()
            .tokens()
            .replace(&TokenPair::new("a1", "r1"))
            .unwrap();

        assert!(path.exists());
        assert_eq!(gateway.session_state(), SessionState::Active);
    }

    #[test]
    fn test_headless_gateway_has_no_storage() {
        let settings = ClientSettings {
            context: ExecutionContext::Headless,
            ..ClientSettings::default()
        };

        let gateway = build_gateway(&settings).unwrap();

        assert!(!gateway.client().tokens().is_available());
    }
}
