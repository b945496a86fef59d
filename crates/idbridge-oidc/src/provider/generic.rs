//! Any OpenID Connect provider that publishes a discovery document.
//!
//! Endpoints come from `{issuer_url}/.well-known/openid-configuration`
//! unless every one of them is overridden in the configuration. Discovery is
//! repeated per call; there is no cache.

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::{CallbackQuery, Dependencies, Provider, into_claims_result};
use crate::boolean::normalize_bool;
use crate::claims::Claims;
use crate::config::ProviderConfig;
use crate::context::{AuthFlowContext, RequestContext};
use crate::discovery::discover;
use crate::error::{ClaimsError, FetchError, ProviderError};
use crate::fetch::{AuthenticatedClient, fetch_json};
use crate::oauth2::{AuthCodeOption, Endpoint, OAuth2Settings, OAuth2Token};

/// Endpoints of a generic provider after applying overrides.
#[derive(Debug, Clone)]
struct ResolvedEndpoints {
    endpoint: Endpoint,
    userinfo: Url,
    /// Issuer declared by the discovery document, or the configured one.
    issuer: String,
}

/// Generic OpenID Connect adapter.
#[derive(Debug)]
pub struct GenericProvider {
    config: ProviderConfig,
    deps: Dependencies,
    issuer: Url,
}

impl GenericProvider {
    /// Creates the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if no issuer URL is configured.
    pub fn new(config: ProviderConfig, deps: Dependencies) -> Result<Self, ProviderError> {
        let issuer = config.issuer_url.clone().ok_or_else(|| {
            ProviderError::configuration(format!(
                "generic provider '{}' requires an issuer_url",
                config.id
            ))
        })?;

        Ok(Self {
            config,
            deps,
            issuer,
        })
    }

    /// Returns the configured issuer.
    #[must_use]
    pub fn issuer(&self) -> &Url {
        &self.issuer
    }

    /// Fetches the userinfo document as loosely-typed JSON.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error unchanged.
    pub async fn profile(
        &self,
        client: &AuthenticatedClient,
        userinfo: &Url,
    ) -> Result<Value, FetchError> {
        fetch_json(client, &self.config.id, userinfo).await
    }

    async fn resolve(&self, ctx: &RequestContext) -> Result<ResolvedEndpoints, ProviderError> {
        if let (Some(auth_url), Some(token_url), Some(userinfo)) = (
            &self.config.auth_url,
            &self.config.token_url,
            &self.config.profile_url,
        ) {
            return Ok(ResolvedEndpoints {
                endpoint: Endpoint {
                    auth_url: auth_url.clone(),
                    token_url: token_url.clone(),
                },
                userinfo: userinfo.clone(),
                issuer: self.configured_issuer(),
            });
        }

        let client = self.deps.http().unauthenticated(ctx);
        let document = discover(&client, &self.config.id, &self.issuer).await?;

        let userinfo = self
            .config
            .profile_url
            .clone()
            .or(document.userinfo_endpoint)
            .ok_or_else(|| {
                ProviderError::configuration(format!(
                    "provider '{}' advertises no userinfo_endpoint and no profile_url is configured",
                    self.config.id
                ))
            })?;

        Ok(ResolvedEndpoints {
            endpoint: Endpoint {
                auth_url: self
                    .config
                    .auth_url
                    .clone()
                    .unwrap_or(document.authorization_endpoint),
                token_url: self
                    .config
                    .token_url
                    .clone()
                    .unwrap_or(document.token_endpoint),
            },
            userinfo,
            issuer: document.issuer,
        })
    }

    /// The configured issuer without the `/` that URL parsing appends to a
    /// bare host.
    fn configured_issuer(&self) -> String {
        let issuer = self.issuer.as_str();
        if self.issuer.path() == "/" {
            issuer.trim_end_matches('/').to_string()
        } else {
            issuer.to_string()
        }
    }

    async fn resolve_claims(
        &self,
        ctx: &RequestContext,
        token: &OAuth2Token,
    ) -> Result<Claims, ProviderError> {
        // Redirect base first so a misconfigured flow makes no requests.
        self.deps.redirect_url(&self.config)?;
        let resolved = self.resolve(ctx).await?;

        let client = self.deps.http().authenticated(ctx, token);
        let profile = self.profile(&client, &resolved.userinfo).await?;

        map_standard_claims(&self.config.id, &resolved.issuer, &profile)
    }
}

/// Maps a standard OIDC userinfo document.
fn map_standard_claims(provider: &str, issuer: &str, profile: &Value) -> Result<Claims, ProviderError> {
    let text = |key: &str| -> String {
        profile
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let subject = match profile.get("sub") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(sub)) => sub.clone(),
        Some(Value::Number(sub)) => sub.to_string(),
        Some(other) => {
            return Err(FetchError::malformed(
                provider,
                format!("sub: expected a string or number, got {other}"),
            )
            .into());
        }
    };

    let email_verified = match profile.get("email_verified") {
        Some(value) => normalize_bool(value).ok_or_else(|| {
            FetchError::malformed(provider, format!("email_verified: cannot interpret {value} as a boolean"))
        })?,
        None => false,
    };

    Ok(Claims {
        subject,
        issuer: issuer.to_string(),
        email: text("email"),
        email_verified,
        given_name: text("given_name"),
        last_name: text("family_name"),
        picture: text("picture"),
        locale: text("locale"),
    })
}

#[async_trait]
impl Provider for GenericProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn oauth2(&self, ctx: &RequestContext) -> Result<OAuth2Settings, ProviderError> {
        let redirect_url = self.deps.redirect_url(&self.config)?;
        let resolved = self.resolve(ctx).await?;

        Ok(OAuth2Settings {
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            endpoint: resolved.endpoint,
            scopes: self.config.scope.clone(),
            redirect_url,
        })
    }

    fn auth_code_url_options(&self, _flow: &AuthFlowContext) -> Vec<AuthCodeOption> {
        Vec::new()
    }

    #[tracing::instrument(
        name = "oidc.generic.claims",
        skip_all,
        fields(provider = %self.config.id, issuer = %self.issuer)
    )]
    async fn claims(
        &self,
        ctx: &RequestContext,
        token: &OAuth2Token,
        _query: &CallbackQuery,
    ) -> Result<Claims, ClaimsError> {
        into_claims_result(&self.config.id, self.resolve_claims(ctx, token).await)
    }
}
