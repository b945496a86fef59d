//! OAuth 2.0 boundary types.
//!
//! The authorization-code exchange itself happens outside this crate. These
//! types describe what a provider hands to that exchange ([`OAuth2Settings`],
//! [`AuthCodeOption`]) and what comes back from it ([`OAuth2Token`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

/// Authorization and token endpoints of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Authorization endpoint the user is redirected to.
    pub auth_url: Url,
    /// Token endpoint the authorization code is exchanged at.
    pub token_url: Url,
}

/// Settings for the authorization-code flow of one provider.
#[derive(Clone)]
pub struct OAuth2Settings {
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Provider endpoints.
    pub endpoint: Endpoint,
    /// Scopes to request.
    pub scopes: Vec<String>,
    /// Callback URL registered with the provider.
    pub redirect_url: Url,
}

impl OAuth2Settings {
    /// Builds the authorization URL the user should be redirected to.
    ///
    /// Options are appended after the standard parameters, in order.
    #[must_use]
    pub fn authorization_url(&self, state: &str, options: &[AuthCodeOption]) -> Url {
        let mut url = self.endpoint.auth_url.clone();
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("response_type", "code");
            params.append_pair("client_id", &self.client_id);
            params.append_pair("redirect_uri", self.redirect_url.as_str());
            if !self.scopes.is_empty() {
                params.append_pair("scope", &self.scopes.join(" "));
            }
            params.append_pair("state", state);

            for option in options {
                params.append_pair(&option.key, &option.value);
            }
        }
        url
    }
}

impl fmt::Debug for OAuth2Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Settings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("scopes", &self.scopes)
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

/// An extra query parameter for the authorization URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCodeOption {
    /// Parameter name.
    pub key: String,
    /// Parameter value.
    pub value: String,
}

impl AuthCodeOption {
    /// Creates an option.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `access_type=offline`, requesting a refresh token.
    #[must_use]
    pub fn access_type_offline() -> Self {
        Self::new("access_type", "offline")
    }

    /// `prompt=consent`, forcing the consent screen.
    #[must_use]
    pub fn prompt_consent() -> Self {
        Self::new("prompt", "consent")
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Result of a completed authorization-code exchange.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuth2Token {
    /// The access token used against the profile endpoint.
    pub access_token: String,

    /// The token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Optional refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token expires.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry: Option<OffsetDateTime>,
}

impl OAuth2Token {
    /// Creates a bearer token without refresh token or expiry.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            refresh_token: None,
            expiry: None,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the expiry.
    #[must_use]
    pub fn with_expiry(mut self, expiry: OffsetDateTime) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Returns `true` if the token has a known expiry in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiry
            .is_some_and(|expiry| expiry <= OffsetDateTime::now_utc())
    }
}

impl fmt::Debug for OAuth2Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Token")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expiry", &self.expiry)
            .finish()
    }
}
