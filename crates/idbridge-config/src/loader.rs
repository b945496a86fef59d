//! Layered configuration loading.

use std::path::PathBuf;

use config::{Config, Environment, File};

use crate::{AppConfig, ConfigError};

/// File read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "idbridge.toml";

/// Prefix of environment overrides, e.g. `IDBRIDGE__LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "IDBRIDGE";

/// Loads, merges and validates the configuration.
///
/// A missing file is not an error; defaults and environment overrides still
/// apply.
///
/// # Errors
///
/// Returns an error if a source cannot be parsed or validation fails.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    let path = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
    if path.exists() {
        tracing::debug!(path = %path.display(), "Loading configuration file");
        builder = builder.add_source(File::from(path));
    } else {
        tracing::debug!(path = %path.display(), "Configuration file not found, using defaults");
    }

    // Environment variable overrides, e.g., IDBRIDGE__HTTP__RETRY__MAX_RETRIES=1
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );

    let merged: AppConfig = builder.build()?.try_deserialize()?;
    merged.validate()?;
    Ok(merged)
}
