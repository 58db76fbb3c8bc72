//! Agenda Application - Session core
//!
//! This crate holds the client-side session subsystem: token storage,
//! endpoint resolution, the identity cache, the authenticated request
//! pipeline and the gateway exposing every backend operation. I/O goes
//! through the ports in [`ports`]; adapters live in the infrastructure
//! crate.

pub mod auth;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod ports;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use auth::{IdentityCache, TokenStore, TokensChanged};
pub use client::AuthenticatedClient;
pub use endpoint::{EndpointResolver, LOCAL_API_URL, PRODUCTION_API_URL, ResolutionStep};
pub use error::{ApiError, ApiResult};
pub use gateway::{AuthGateway, SessionStatus};
pub use ports::{HttpTransport, KeyValueStorage, MemoryStorage, StorageError, TransportError};
pub use settings::{ClientSettings, ExecutionContext, RuntimeMode};
