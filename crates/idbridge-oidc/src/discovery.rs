//! OpenID Connect Discovery.
//!
//! Fetches provider metadata from `{issuer}/.well-known/openid-configuration`
//! through the resilient fetcher, so discovery shares the retry, tracing and
//! error classification of profile requests.
//!
//! # References
//!
//! - [OpenID Connect Discovery 1.0](https://openid.net/specs/openid-connect-discovery-1_0.html)

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ProviderError;
use crate::fetch::{AuthenticatedClient, fetch_json};

/// The subset of provider metadata the adapters use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    /// Issuer identifier. Must match the configured issuer.
    pub issuer: String,

    /// Authorization endpoint.
    pub authorization_endpoint: Url,

    /// Token endpoint.
    pub token_endpoint: Url,

    /// UserInfo endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<Url>,

    /// JWKS endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<Url>,

    /// Supported scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes_supported: Vec<String>,

    /// Supported claims.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims_supported: Vec<String>,
}

/// Builds the discovery URL for an issuer.
#[must_use]
pub fn discovery_url(issuer: &Url) -> Url {
    let mut url = issuer.clone();
    let path = issuer.path().trim_end_matches('/');
    url.set_path(&format!("{path}/.well-known/openid-configuration"));
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Fetches and validates the discovery document for `issuer`.
///
/// # Errors
///
/// Returns [`ProviderError::Fetch`] if the document cannot be fetched or
/// decoded, and [`ProviderError::Configuration`] if the document's issuer does
/// not match `issuer`.
pub async fn discover(
    client: &AuthenticatedClient,
    provider: &str,
    issuer: &Url,
) -> Result<DiscoveryDocument, ProviderError> {
    let url = discovery_url(issuer);
    tracing::debug!(provider = %provider, url = %url, "Fetching OIDC discovery document");

    let document: DiscoveryDocument = fetch_json(client, provider, &url).await?;
    validate_issuer(&document, issuer)?;

    Ok(document)
}

/// The document issuer must be identical to the configured issuer, ignoring
/// a trailing slash.
fn validate_issuer(document: &DiscoveryDocument, expected: &Url) -> Result<(), ProviderError> {
    let expected = expected.as_str().trim_end_matches('/');
    let actual = document.issuer.trim_end_matches('/');

    if expected != actual {
        return Err(ProviderError::configuration(format!(
            "issuer mismatch: expected {expected}, discovery document declares {actual}"
        )));
    }

    Ok(())
}
