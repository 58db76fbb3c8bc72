//! Agenda Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus settings loading, tracing
//! setup and gateway wiring.

pub mod adapters;
pub mod bootstrap;
pub mod persistence;
pub mod settings;
pub mod telemetry;

pub use adapters::ReqwestTransport;
pub use bootstrap::{BootstrapError, build_gateway, build_gateway_with};
pub use persistence::{FileTokenStorage, SCHEMA_VERSION};
pub use settings::{ENV_PREFIX, SettingsError, default_config_file, load_settings};
pub use telemetry::init_tracing;
