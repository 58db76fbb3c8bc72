//! Resolution steps
//!
//! Each step either names an address or passes to the next one.

use std::sync::Arc;
use std::time::Duration;

use agenda_domain::{ApiRequest, join_url};
use async_trait::async_trait;
use tracing::debug;

use crate::ports::HttpTransport;
use crate::settings::RuntimeMode;

/// One strategy in the ordered endpoint resolution chain.
#[async_trait]
pub trait ResolutionStep: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns an address, or `None` to defer to the next step.
    ///
    /// Steps never fail; any problem means "no answer".
    async fn attempt(&self) -> Option<String>;
}

/// Uses an explicitly configured address.
#[derive(Debug, Clone)]
pub struct ConfiguredOverride {
    address: Option<String>,
}

impl ConfiguredOverride {
    /// Creates the step. Blank addresses are ignored.
    #[must_use]
    pub fn new(address: Option<String>) -> Self {
        let address = address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        Self { address }
    }
}

#[async_trait]
impl ResolutionStep for ConfiguredOverride {
    fn name(&self) -> &'static str {
        "configured-override"
    }

    async fn attempt(&self) -> Option<String> {
        self.address.clone()
    }
}

/// Probes the local development backend's health endpoint.
pub struct LocalProbe {
    transport: Arc<dyn HttpTransport>,
    address: String,
    timeout: Duration,
}

impl LocalProbe {
    /// Creates a probe of `address` bounded by `timeout`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        address: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            address: address.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ResolutionStep for LocalProbe {
    fn name(&self) -> &'static str {
        "local-probe"
    }

    async fn attempt(&self) -> Option<String> {
        let url = join_url(&self.address, "/health");
        let request = ApiRequest::get(url.as_str()).with_timeout(self.timeout);

        match tokio::time::timeout(self.timeout, self.transport.execute(request)).await {
            Ok(Ok(response)) if response.is_success() => Some(self.address.clone()),
            Ok(Ok(response)) => {
                debug!(
                    url = %url,
                    status = response.status.as_u16(),
                    "local probe answered with failure"
                );
                None
            }
            Ok(Err(error)) => {
                debug!(url = %url, error = %error, "local probe failed");
                None
            }
            Err(_) => {
                debug!(url = %url, timeout_ms = self.timeout.as_millis(), "local probe timed out");
                None
            }
        }
    }
}

/// Picks the local address in development mode without probing.
#[derive(Debug, Clone)]
pub struct DevelopmentDefault {
    mode: RuntimeMode,
    address: String,
}

impl DevelopmentDefault {
    /// Creates the step.
    #[must_use]
    pub fn new(mode: RuntimeMode, address: impl Into<String>) -> Self {
        Self {
            mode,
            address: address.into(),
        }
    }
}

#[async_trait]
impl ResolutionStep for DevelopmentDefault {
    fn name(&self) -> &'static str {
        "development-default"
    }

    async fn attempt(&self) -> Option<String> {
        (self.mode == RuntimeMode::Development).then(|| self.address.clone())
    }
}

/// Always answers with the hosted production address.
#[derive(Debug, Clone)]
pub struct ProductionFallback {
    address: String,
}

impl ProductionFallback {
    /// Creates the step.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl ResolutionStep for ProductionFallback {
    fn name(&self) -> &'static str {
        "production-fallback"
    }

    async fn attempt(&self) -> Option<String> {
        Some(self.address.clone())
    }
}
