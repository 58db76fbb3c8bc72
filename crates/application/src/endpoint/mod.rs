//! Endpoint resolution
//!
//! Decides which backend address the client talks to. The answer is
//! computed once per process and reused until [`EndpointResolver::reset`].

mod steps;

pub use steps::{
    ConfiguredOverride, DevelopmentDefault, LocalProbe, ProductionFallback, ResolutionStep,
};

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::ports::HttpTransport;
use crate::settings::ClientSettings;

/// Address of the local development backend.
pub const LOCAL_API_URL: &str = "http://localhost:8000/api";
/// Address of the hosted production backend.
pub const PRODUCTION_API_URL: &str = "https://backend-gerenciador-de-contatos.onrender.com/api";

/// Memoizing resolver over an ordered list of [`ResolutionStep`]s.
pub struct EndpointResolver {
    steps: Vec<Box<dyn ResolutionStep>>,
    cached: Mutex<Option<String>>,
}

impl EndpointResolver {
    /// Creates a resolver that tries `steps` in order.
    #[must_use]
    pub fn new(steps: Vec<Box<dyn ResolutionStep>>) -> Self {
        Self {
            steps,
            cached: Mutex::new(None),
        }
    }

    /// Builds the step chain for the configured execution context.
    ///
    /// Interactive: override, local probe, production.
    /// Headless: override, local in development mode, production.
    #[must_use]
    pub fn from_settings(settings: &ClientSettings, transport: Arc<dyn HttpTransport>) -> Self {
        let mut steps: Vec<Box<dyn ResolutionStep>> =
            vec![Box::new(ConfiguredOverride::new(settings.endpoint_override()))];

        if settings.context.can_probe() {
            steps.push(Box::new(LocalProbe::new(
                transport,
                settings.local_url.clone(),
                settings.probe_timeout(),
            )));
        } else {
            steps.push(Box::new(DevelopmentDefault::new(
                settings.mode,
                settings.local_url.clone(),
            )));
        }

        steps.push(Box::new(ProductionFallback::new(settings.production_url.clone())));
        Self::new(steps)
    }

    /// Returns the memoized address, resolving it on first use.
    ///
    /// Concurrent first callers wait for one resolution.
    pub async fn resolve(&self) -> String {
        let mut cached = self.cached.lock().await;
        if let Some(address) = cached.as_ref() {
            return address.clone();
        }

        let mut resolved = None;
        for step in &self.steps {
            if let Some(address) = step.attempt().await {
                info!(step = step.name(), address = %address, "resolved API endpoint");
                resolved = Some(address);
                break;
            }
        }

        let address = resolved.unwrap_or_else(|| {
            warn!("no resolution step answered, using production address");
            PRODUCTION_API_URL.to_string()
        });
        *cached = Some(address.clone());
        address
    }

    /// Returns the memoized address without resolving.
    pub async fn current(&self) -> Option<String> {
        self.cached.lock().await.clone()
    }

    /// Forgets the memoized address; the next `resolve` recomputes it.
    pub async fn reset(&self) {
        *self.cached.lock().await = None;
    }
}
