//! Client settings
//!
//! Plain data; loading from files and the environment lives in the
//! infrastructure crate.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::endpoint::{LOCAL_API_URL, PRODUCTION_API_URL};

/// Default timeout of the local development probe.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Build flavour the client runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// Developer machine; prefer the local backend.
    Development,
    /// Released build.
    #[default]
    Production,
}

/// Capabilities of the environment the client runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// Interactive client: durable token storage and network probing available.
    #[default]
    Interactive,
    /// Headless context (server-side rendering, batch jobs): no durable
    /// storage and no probing.
    Headless,
}

impl ExecutionContext {
    /// Returns true if the local-development probe may run.
    #[must_use]
    pub const fn can_probe(self) -> bool {
        matches!(self, Self::Interactive)
    }

    /// Returns true if durable token storage is available.
    #[must_use]
    pub const fn has_storage(self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// All knobs of the session client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Explicit API base address; wins over everything else.
    pub api_base_url: Option<String>,
    /// Secondary override key, used when `api_base_url` is unset.
    pub api_url: Option<String>,
    /// Runtime mode.
    pub mode: RuntimeMode,
    /// Execution context.
    pub context: ExecutionContext,
    /// Address of the local development backend.
    pub local_url: String,
    /// Address of the hosted production backend.
    pub production_url: String,
    /// Timeout of the local health probe, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Timeout of every other request, in milliseconds. Unbounded if unset.
    pub request_timeout_ms: Option<u64>,
    /// Location of the durable token file. Platform default if unset.
    pub token_file: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_url: None,
            mode: RuntimeMode::default(),
            context: ExecutionContext::default(),
            local_url: LOCAL_API_URL.to_string(),
            production_url: PRODUCTION_API_URL.to_string(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            request_timeout_ms: None,
            token_file: None,
        }
    }
}

impl ClientSettings {
    /// Returns the configured override, trimmed, if it is non-empty.
    #[must_use]
    pub fn endpoint_override(&self) -> Option<String> {
        [self.api_base_url.as_deref(), self.api_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Returns the probe timeout.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Returns the request timeout, if bounded.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_override_precedence_and_trimming() {
        let mut settings = ClientSettings {
            api_base_url: Some("   ".to_string()),
            api_url: Some(" http://api.test/api ".to_string()),
            ..ClientSettings::default()
        };
        assert_eq!(settings.endpoint_override().as_deref(), Some("http://api.test/api"));

        settings.api_base_url = Some("http://primary.test".to_string());
        assert_eq!(settings.endpoint_override().as_deref(), Some("http://primary.test"));

        assert_eq!(ClientSettings::default().endpoint_override(), None);
    }

    #[test]
    fn test_defaults() {
        let settings = ClientSettings::default();
        assert_eq!(settings.probe_timeout(), Duration::from_secs(2));
        assert_eq!(settings.request_timeout(), None);
        assert!(settings.context.can_probe());
        assert!(!ExecutionContext::Headless.has_storage());
    }
}
