//! Identity provider configuration.
//!
//! This module provides the static, per-provider configuration that the
//! registry loads once at startup.
//!
//! # Example
//!
//! ```ignore
//! use idbridge_oidc::config::{ProviderConfig, ProviderKind};
//!
//! let config = ProviderConfig::new("linkedin", ProviderKind::LinkedIn, "your-client-id")
//!     .with_client_secret("your-client-secret")
//!     .with_scope(vec!["openid", "profile", "email"]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ProviderError;

/// Path under the redirect base that providers redirect back to.
pub const CALLBACK_PATH: &str = "/self-service/methods/oidc/callback";

/// The adapter implementation backing a configured provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// LinkedIn (OpenID Connect userinfo).
    LinkedIn,
    /// Google.
    Google,
    /// Any OpenID Connect provider supporting discovery.
    Generic,
}

impl ProviderKind {
    /// Returns the configuration name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkedIn => "linkedin",
            Self::Google => "google",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a single identity provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique identifier for this provider (e.g., "linkedin", "corp-sso").
    /// Used in the callback path and for registry lookups.
    pub id: String,

    /// The adapter implementation to use.
    pub provider: ProviderKind,

    /// Human-readable name for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// OAuth client ID registered with the provider.
    pub client_id: String,

    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: String,

    /// OAuth scopes to request.
    #[serde(default)]
    pub scope: Vec<String>,

    /// The OIDC issuer URL. Required for generic providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_url: Option<Url>,

    /// Optional override for the authorization endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<Url>,

    /// Optional override for the token endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<Url>,

    /// Optional override for the profile (userinfo) endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<Url>,
}

impl ProviderConfig {
    /// Creates a new provider configuration with required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, provider: ProviderKind, client_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider,
            label: None,
            client_id: client_id.into(),
            client_secret: String::new(),
            scope: Vec::new(),
            issuer_url: None,
            auth_url: None,
            token_url: None,
            profile_url: None,
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = secret.into();
        self
    }

    /// Sets the OAuth scopes.
    #[must_use]
    pub fn with_scope(mut self, scope: Vec<impl Into<String>>) -> Self {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the issuer URL.
    #[must_use]
    pub fn with_issuer_url(mut self, issuer: Url) -> Self {
        self.issuer_url = Some(issuer);
        self
    }

    /// Sets the authorization endpoint override.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = Some(url);
        self
    }

    /// Sets the token endpoint override.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = Some(url);
        self
    }

    /// Sets the profile endpoint override.
    #[must_use]
    pub fn with_profile_url(mut self, url: Url) -> Self {
        self.profile_url = Some(url);
        self
    }

    /// Returns the label, falling back to the ID.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Returns `true` if the given scope is configured.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }

    /// Computes the callback URL for this provider under `base`.
    ///
    /// `https://id.example.com/` with ID `linkedin` yields
    /// `https://id.example.com/self-service/methods/oidc/callback/linkedin`.
    #[must_use]
    pub fn redirect_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let path = format!(
            "{}{}/{}",
            base.path().trim_end_matches('/'),
            CALLBACK_PATH,
            self.id
        );
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if:
    /// - The ID is empty or contains characters other than ASCII
    ///   alphanumerics, `-` and `_`
    /// - The client ID is empty
    /// - A generic provider has no issuer URL
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.id.is_empty() {
            return Err(ProviderError::configuration("provider id cannot be empty"));
        }

        if !self
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ProviderError::configuration(format!(
                "provider id '{}' may only contain ASCII letters, digits, '-' and '_'",
                self.id
            )));
        }

        if self.client_id.is_empty() {
            return Err(ProviderError::configuration(format!(
                "provider '{}' requires a client_id",
                self.id
            )));
        }

        if self.provider == ProviderKind::Generic && self.issuer_url.is_none() {
            return Err(ProviderError::configuration(format!(
                "generic provider '{}' requires an issuer_url",
                self.id
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("label", &self.label)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .field("issuer_url", &self.issuer_url)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("profile_url", &self.profile_url)
            .finish()
    }
}
