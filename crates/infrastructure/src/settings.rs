//! Settings loader
//!
//! Reads [`ClientSettings`] from an optional TOML file and `AGENDA_*`
//! environment variables, the latter winning.

use std::path::{Path, PathBuf};

use agenda_application::ClientSettings;
use config::{Config, Environment, File};
use tracing::debug;
use url::Url;

/// Prefix of the environment variables read by [`load_settings`].
pub const ENV_PREFIX: &str = "AGENDA";

/// Error type for settings loading.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A source could not be read or did not match the settings shape.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A configured address is not an absolute URL.
    #[error("Invalid URL in `{key}`: {message}")]
    InvalidUrl {
        /// Settings key holding the value.
        key: &'static str,
        /// Parser message.
        message: String,
    },
}

/// Returns the platform default location of the settings file.
#[must_use]
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("agenda").join("config.toml"))
}

/// Loads settings.
///
/// An explicit `file` must exist; otherwise the default file is read if
/// present. Unset keys keep their defaults.
///
/// # Errors
///
/// Returns an error if a source is malformed or an address is not a URL.
pub fn load_settings(file: Option<&Path>) -> Result<ClientSettings, SettingsError> {
    let mut builder = Config::builder();

    if let Some(path) = file {
        builder = builder.add_source(File::from(path.to_path_buf()).required(true));
    } else if let Some(path) = default_config_file() {
        builder = builder.add_source(File::from(path).required(false));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

    let settings: ClientSettings = builder.build()?.try_deserialize()?;
    validate(&settings)?;
    debug!(mode = ?settings.mode, context = ?settings.context, "settings loaded");
    Ok(settings)
}

fn validate(settings: &ClientSettings) -> Result<(), SettingsError> {
    let addresses = [
        ("api_base_url", settings.endpoint_override()),
        ("local_url", Some(settings.local_url.clone())),
        ("production_url", Some(settings.production_url.clone())),
    ];

    for (key, value) in addresses {
        if let Some(value) = value {
            Url::parse(&value).map_err(|e| SettingsError::InvalidUrl {
                key,
                message: format!("{e}: {value}"),
            })?;
        }
    }
    Ok(())
}
