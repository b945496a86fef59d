//! Google.
//!
//! Google does not accept `offline_access` as a scope. When it is configured,
//! the scope is dropped from the request and a refresh token is asked for
//! through `access_type=offline` and `prompt=consent` instead.

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

/// Issuer reported in Google claims.
pub const ISSUER: &str = "https://accounts.google.com";

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const PROFILE_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const OFFLINE_ACCESS_SCOPE: &str = "offline_access";

/// Google userinfo response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleProfile {
    /// Google account ID.
    #[serde(deserialize_with = "null_as_default")]
    pub sub: String,
    /// Primary email address.
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    /// Whether Google verified the email address.
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
    /// BCP 47 tag, only present for some accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Google adapter.
#[derive(Debug)]
pub struct GoogleProvider {
    config: ProviderConfig,
    deps: Dependencies,
    endpoint: Endpoint,
    profile_url: Url,
}

impl GoogleProvider {
    /// Creates the adapter. Endpoint overrides in `config` replace the
    /// Google defaults.
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
    pub async fn profile(&self, client: &AuthenticatedClient) -> Result<GoogleProfile, FetchError> {
        fetch_json(client, &self.config.id, &self.profile_url).await
    }

    fn requested_scopes(&self) -> Vec<String> {
        self.config
            .scope
            .iter()
            .filter(|scope| *scope != OFFLINE_ACCESS_SCOPE)
            .cloned()
            .collect()
    }

    async fn resolve_claims(
        &self,
        ctx: &RequestContext,
        token: &OAuth2Token,
    ) -> Result<Claims, ProviderError> {
        self.oauth2(ctx).await?;

        let client = self.deps.http().authenticated(ctx, token);
        let profile = self.profile(&client).await?;

        Ok(Claims {
            subject: profile.sub,
            issuer: ISSUER.to_string(),
            email: profile.email,
            email_verified: profile.email_verified.get(),
            given_name: profile.given_name,
            last_name: profile.family_name,
            picture: profile.picture,
            locale: profile.locale.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn oauth2(&self, _ctx: &RequestContext) -> Result<OAuth2Settings, ProviderError> {
        Ok(OAuth2Settings {
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            endpoint: self.endpoint.clone(),
            scopes: self.requested_scopes(),
            redirect_url: self.deps.redirect_url(&self.config)?,
        })
    }

    fn auth_code_url_options(&self, _flow: &AuthFlowContext) -> Vec<AuthCodeOption> {
        if self.config.has_scope(OFFLINE_ACCESS_SCOPE) {
            vec![
                AuthCodeOption::access_type_offline(),
                AuthCodeOption::prompt_consent(),
            ]
        } else {
            Vec::new()
        }
    }

    #[tracing::instrument(
        name = "oidc.google.claims",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::fetch::HttpClientFactory;

    fn provider(scope: Vec<&str>) -> GoogleProvider {
        let deps = Dependencies::new(HttpClientFactory::with_defaults().unwrap())
            .with_redirect_base(Url::parse("https://id.example.com").unwrap());
        let config =
            ProviderConfig::new("google", ProviderKind::Google, "client-id").with_scope(scope);
        GoogleProvider::new(config, deps).unwrap()
    }

    #[tokio::test]
    async fn test_offline_access_becomes_auth_code_options() {
        let provider = provider(vec!["openid", "email", "offline_access"]);

        let options = provider.auth_code_url_options(&AuthFlowContext::generate());
        assert_eq!(
            options,
            vec![
                AuthCodeOption::access_type_offline(),
                AuthCodeOption::prompt_consent()
            ]
        );

        let settings = provider.oauth2(&RequestContext::new()).await.unwrap();
        assert_eq!(settings.scopes, vec!["openid", "email"]);
        assert_eq!(settings.endpoint.auth_url.as_str(), AUTH_URL);
    }

    #[test]
    fn test_no_options_without_offline_access() {
        let provider = provider(vec!["openid", "email"]);
        assert!(
            provider
                .auth_code_url_options(&AuthFlowContext::generate())
                .is_empty()
        );
    }

    #[test]
    fn test_profile_deserialization() {
        let profile: GoogleProfile = serde_json::from_str(
            r#"{"sub":"1234","email":"a@example.com","email_verified":true,"locale":"de"}"#,
        )
        .unwrap();
        assert_eq!(profile.sub, "1234");
        assert!(profile.email_verified.get());
        assert_eq!(profile.locale.as_deref(), Some("de"));
        assert_eq!(profile.family_name, "");
    }

    #[test]
    fn test_profile_null_fields() {
        let profile: GoogleProfile = serde_json::from_str(
            r#"{"sub":"1234","email":null,"email_verified":null,"picture":null,"locale":null}"#,
        )
        .unwrap();
        assert_eq!(profile.email, "");
        assert_eq!(profile.picture, "");
        assert!(!profile.email_verified.get());
        assert!(profile.locale.is_none());
    }
}
