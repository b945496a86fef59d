//! The provider contract and its adapters.
//!
//! A [`Provider`] knows how to run the OAuth2 authorization-code flow against
//! one third-party identity service and how to turn the resulting token into
//! canonical [`Claims`]. Adapters are built from a [`ProviderConfig`] by
//! [`build_provider`] and shared as `Arc<dyn Provider>`.

mod generic;
mod google;
mod linkedin;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use url::Url;

pub use generic::GenericProvider;
pub use google::{GoogleProfile, GoogleProvider};
pub use linkedin::{LinkedInLocale, LinkedInProfile, LinkedInProvider};

use crate::claims::Claims;
use crate::config::{ProviderConfig, ProviderKind};
use crate::context::{AuthFlowContext, RequestContext};
use crate::error::{ClaimsError, ProviderError};
use crate::fetch::HttpClientFactory;
use crate::oauth2::{AuthCodeOption, OAuth2Settings, OAuth2Token};

/// Query parameters of the callback request.
pub type CallbackQuery = HashMap<String, String>;

/// Collaborators injected into every adapter.
#[derive(Debug, Clone)]
pub struct Dependencies {
    http: HttpClientFactory,
    redirect_base: Option<Url>,
}

impl Dependencies {
    /// Creates dependencies without a redirect base.
    #[must_use]
    pub fn new(http: HttpClientFactory) -> Self {
        Self {
            http,
            redirect_base: None,
        }
    }

    /// Sets the public base URL callbacks are derived from.
    #[must_use]
    pub fn with_redirect_base(mut self, base: Url) -> Self {
        self.redirect_base = Some(base);
        self
    }

    /// Returns the HTTP client factory.
    #[must_use]
    pub fn http(&self) -> &HttpClientFactory {
        &self.http
    }

    /// Returns the redirect base, if configured.
    #[must_use]
    pub fn redirect_base(&self) -> Option<&Url> {
        self.redirect_base.as_ref()
    }

    /// Computes the callback URL for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if no redirect base is set.
    pub fn redirect_url(&self, config: &ProviderConfig) -> Result<Url, ProviderError> {
        let base = self.redirect_base.as_ref().ok_or_else(|| {
            ProviderError::configuration(format!(
                "cannot compute redirect URL for provider '{}': no redirect base configured",
                config.id
            ))
        })?;
        Ok(config.redirect_url(base))
    }
}

/// A third-party identity provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Returns the static configuration.
    fn config(&self) -> &ProviderConfig;

    /// Returns the provider ID.
    fn id(&self) -> &str {
        &self.config().id
    }

    /// Returns the settings for the authorization-code flow.
    ///
    /// # Errors
    ///
    /// Returns a configuration-class error if the redirect URL cannot be
    /// computed or the provider's endpoints cannot be resolved.
    async fn oauth2(&self, ctx: &RequestContext) -> Result<OAuth2Settings, ProviderError>;

    /// Returns provider-specific extra parameters for the authorization URL.
    fn auth_code_url_options(&self, flow: &AuthFlowContext) -> Vec<AuthCodeOption>;

    /// Resolves the authenticated user's claims from a completed exchange.
    ///
    /// # Errors
    ///
    /// Every failure is a [`ClaimsError`] that displays only the generic
    /// internal-server-error message.
    async fn claims(
        &self,
        ctx: &RequestContext,
        token: &OAuth2Token,
        query: &CallbackQuery,
    ) -> Result<Claims, ClaimsError>;
}

/// Builds the adapter for `config.provider`.
///
/// # Errors
///
/// Returns [`ProviderError::Configuration`] if the configuration is invalid.
pub fn build_provider(
    config: ProviderConfig,
    deps: Dependencies,
) -> Result<Arc<dyn Provider>, ProviderError> {
    config.validate()?;

    let provider: Arc<dyn Provider> = match config.provider {
        ProviderKind::LinkedIn => Arc::new(LinkedInProvider::new(config, deps)?),
        ProviderKind::Google => Arc::new(GoogleProvider::new(config, deps)?),
        ProviderKind::Generic => Arc::new(GenericProvider::new(config, deps)?),
    };

    Ok(provider)
}

/// Validates mapped claims and classifies any failure at the boundary.
pub(crate) fn into_claims_result(
    provider: &str,
    result: Result<Claims, ProviderError>,
) -> Result<Claims, ClaimsError> {
    result
        .and_then(|claims| {
            claims
                .validate()
                .map_err(|source| ProviderError::InvalidProfile {
                    provider: provider.to_string(),
                    source,
                })?;
            Ok(claims)
        })
        .map_err(|err| ClaimsError::from_provider_error(provider, err))
}

/// Deserializes an explicit `null` the same as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses `override_url`, or the built-in default when none is configured.
pub(crate) fn url_or_default(
    override_url: Option<&Url>,
    default: &str,
) -> Result<Url, ProviderError> {
    match override_url {
        Some(url) => Ok(url.clone()),
        None => Ok(Url::parse(default)?),
    }
}
