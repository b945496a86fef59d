//! LinkedIn, via its OpenID Connect userinfo endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{
    CallbackQuery, Dependencies, Provider, into_claims_result, null_as_default, url_or_default,
};
use crate::boolean::ConvertibleBoolean;
use crate::claims::Claims;
use crate::config::ProviderConfig;
use crate::context::{AuthFlowContext, RequestContext};
use crate::error::{ClaimsError, FetchError, ProviderError};
use crate::fetch::{AuthenticatedClient, fetch_json};
use crate::oauth2::{AuthCodeOption, Endpoint, OAuth2Settings, OAuth2Token};

/// Issuer reported in LinkedIn claims.
pub const ISSUER: &str = "https://login.linkedin.com/";

const AUTH_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
const TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
const PROFILE_URL: &str = "https://api.linkedin.com/v2/userinfo";

/// LinkedIn userinfo response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedInProfile {
    /// Member ID.
    #[serde(rename = "sub", deserialize_with = "null_as_default")]
    pub id: String,
    /// Primary email address.
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    /// Whether LinkedIn verified the email address.
    pub email_verified: ConvertibleBoolean,
    /// First name.
    #[serde(deserialize_with = "null_as_default")]
    pub given_name: String,
    /// Last name.
    #[serde(deserialize_with = "null_as_default")]
    pub family_name: String,
    /// Profile picture URL.
    #[serde(deserialize_with = "null_as_default")]
    pub picture: String,
    /// Absent for members without a preferred locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<LinkedInLocale>,
}

/// Nested locale object of the userinfo response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedInLocale {
    /// ISO 3166 country code.
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    /// Language tag, e.g. `en-US`.
    #[serde(deserialize_with = "null_as_default")]
    pub language: String,
}

/// LinkedIn adapter.
#[derive(Debug)]
pub struct LinkedInProvider {
    config: ProviderConfig,
    deps: Dependencies,
    endpoint: Endpoint,
    profile_url: Url,
}

impl LinkedInProvider {
    /// Creates the adapter. Endpoint overrides in `config` replace the
    /// LinkedIn defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Url`] if a built-in URL fails to parse.
    pub fn new(config: ProviderConfig, deps: Dependencies) -> Result<Self, ProviderError> {
        let endpoint = Endpoint {
            auth_url: url_or_default(config.auth_url.as_ref(), AUTH_URL)?,
            token_url: url_or_default(config.token_url.as_ref(), TOKEN_URL)?,
        };
        let profile_url = url_or_default(config.profile_url.as_ref(), PROFILE_URL)?;

        Ok(Self {
            config,
            deps,
            endpoint,
            profile_url,
        })
    }

    /// Fetches the userinfo document.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error unchanged.
    pub async fn profile(&self, client: &AuthenticatedClient) -> Result<LinkedInProfile, FetchError> {
        fetch_json(client, &self.config.id, &self.profile_url).await
    }

    /// The member's preferred language, or `""` when LinkedIn sent no locale.
    #[must_use]
    pub fn profile_locale(profile: &LinkedInProfile) -> String {
        profile
            .locale
            .as_ref()
            .map(|locale| locale.language.clone())
            .unwrap_or_default()
    }

    async fn resolve_claims(
        &self,
        ctx: &RequestContext,
        token: &OAuth2Token,
    ) -> Result<Claims, ProviderError> {
        // Fail before any network I/O if the flow is misconfigured.
        self.oauth2(ctx).await?;

        let client = self.deps.http().authenticated(ctx, token);
        let profile = self.profile(&client).await?;

        Ok(Claims {
            locale: Self::profile_locale(&profile),
            subject: profile.id,
            issuer: ISSUER.to_string(),
            email: profile.email,
            email_verified: profile.email_verified.get(),
            given_name: profile.given_name,
            last_name: profile.family_name,
            picture: profile.picture,
        })
    }
}

#[async_trait]
impl Provider for LinkedInProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn oauth2(&self, _ctx: &RequestContext) -> Result<OAuth2Settings, ProviderError> {
        Ok(OAuth2Settings {
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            endpoint: self.endpoint.clone(),
            scopes: self.config.scope.clone(),
            redirect_url: self.deps.redirect_url(&self.config)?,
        })
    }

    fn auth_code_url_options(&self, _flow: &AuthFlowContext) -> Vec<AuthCodeOption> {
        Vec::new()
    }

    #[tracing::instrument(
        name = "oidc.linkedin.claims",
        skip_all,
        fields(provider = %self.config.id)
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
