//! # idbridge-config
//!
//! Application configuration: the redirect base, HTTP client settings,
//! logging and the list of configured identity providers.
//!
//! Configuration is read from a TOML file and overridden by `IDBRIDGE__`
//! prefixed environment variables (see [`loader::load_config`]).

pub mod loader;

use std::collections::HashSet;

use idbridge_oidc::{
    Dependencies, HttpClientConfig, HttpClientFactory, ProviderConfig, ProviderError,
    ProviderRegistry,
};
use serde::{Deserialize, Serialize};
use url::Url;

pub use loader::load_config;

const VALID_LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A provider entry is invalid.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The configuration could not be rendered.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub redirect: RedirectConfig,
    /// Upstream HTTP client settings
    #[serde(default)]
    pub http: HttpClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Configured identity providers
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// Public base URL of the identity system. Callback URLs are derived from
    /// it; without it no authorization flow can start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Checks value ranges and provider entries.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lvl = self.logging.level.to_ascii_lowercase();
        if !VALID_LOG_LEVELS.contains(&lvl.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {VALID_LOG_LEVELS:?}"
            )));
        }

        if self.http.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("http.request_timeout must be > 0".into()));
        }
        if self.http.max_response_size == 0 {
            return Err(ConfigError::Invalid("http.max_response_size must be > 0".into()));
        }
        if self.http.retry.min_backoff > self.http.retry.max_backoff {
            return Err(ConfigError::Invalid(
                "http.retry.min_backoff must be <= http.retry.max_backoff".into(),
            ));
        }

        if let Some(base) = &self.redirect.base_url
            && base.cannot_be_a_base()
        {
            return Err(ConfigError::Invalid(format!(
                "redirect.base_url '{base}' cannot be used as a base URL"
            )));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            provider.validate()?;
            if !seen.insert(provider.id.as_str()) {
                return Err(ProviderError::Duplicate(provider.id.clone()).into());
            }
        }

        if self.redirect.base_url.is_none() && !self.providers.is_empty() {
            tracing::warn!("redirect.base_url is not set; authorization flows will fail");
        }

        Ok(())
    }

    /// Builds the collaborators shared by every provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn dependencies(&self) -> Result<Dependencies, ConfigError> {
        let http = HttpClientFactory::new(self.http.clone())?;
        let deps = Dependencies::new(http);

        Ok(match &self.redirect.base_url {
            Some(base) => deps.with_redirect_base(base.clone()),
            None => deps,
        })
    }

    /// Builds the provider registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or any provider cannot be built.
    pub fn registry(&self) -> Result<ProviderRegistry, ConfigError> {
        let deps = self.dependencies()?;
        Ok(ProviderRegistry::from_configs(self.providers.clone(), &deps)?)
    }

    /// Renders the configuration as TOML with client secrets masked.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut redacted = self.clone();
        for provider in &mut redacted.providers {
            if !provider.client_secret.is_empty() {
                provider.client_secret = "<redacted>".into();
            }
        }
        Ok(toml::to_string_pretty(&redacted)?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use idbridge_oidc::ProviderKind;

    use super::*;

    fn linkedin() -> ProviderConfig {
        ProviderConfig::new("linkedin", ProviderKind::LinkedIn, "client")
            .with_client_secret("s3cret")
            .with_scope(vec!["openid", "email"])
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.http.retry.max_retries, 3);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_backoff_bounds() {
        let mut cfg = AppConfig::default();
        cfg.http.retry.min_backoff = Duration::from_secs(10);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_duplicate_provider_ids() {
        let cfg = AppConfig {
            providers: vec![linkedin(), linkedin()],
            ..AppConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Provider(ProviderError::Duplicate(_)))
        ));
    }

    #[test]
    fn test_registry_from_config() {
        let cfg = AppConfig {
            redirect: RedirectConfig {
                base_url: Some(Url::parse("https://id.example.com").unwrap()),
            },
            providers: vec![linkedin()],
            ..AppConfig::default()
        };

        let registry = cfg.registry().unwrap();
        assert_eq!(registry.ids(), vec!["linkedin"]);
        assert!(cfg.dependencies().unwrap().redirect_base().is_some());
    }

    #[test]
    fn test_redacted_toml() {
        let cfg = AppConfig {
            providers: vec![linkedin()],
            ..AppConfig::default()
        };

        let rendered = cfg.to_redacted_toml().unwrap();
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("linkedin"));
    }
}
