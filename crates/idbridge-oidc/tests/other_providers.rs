//! Google and generic OIDC claims resolution against mocked upstreams.

mod common;

use idbridge_oidc::{
    CallbackQuery, ErrorKind, OAuth2Token, Provider, ProviderConfig, ProviderKind,
    RequestContext, build_provider,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{ACCESS_TOKEN, deps, mock_url};

async fn resolve(provider: &dyn Provider) -> Result<idbridge_oidc::Claims, idbridge_oidc::ClaimsError> {
    provider
        .claims(
            &RequestContext::new(),
            &OAuth2Token::bearer(ACCESS_TOKEN),
            &CallbackQuery::new(),
        )
        .await
}

fn generic(server: &MockServer) -> ProviderConfig {
    ProviderConfig::new("corp", ProviderKind::Generic, "client-id")
        .with_scope(vec!["openid", "email"])
        .with_issuer_url(Url::parse(&server.uri()).unwrap())
}

async fn mount_discovery(server: &MockServer, issuer: &str) {
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{}/authorize", server.uri()),
            "token_endpoint": format!("{}/token", server.uri()),
            "userinfo_endpoint": format!("{}/userinfo", server.uri()),
            "jwks_uri": format!("{}/jwks", server.uri())
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_google_claims() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/userinfo"))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "1094",
            "email": "ann@example.com",
            "email_verified": 1,
            "given_name": "Ann",
            "family_name": "Lee",
            "picture": "https://lh3.example.com/a.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new("google", ProviderKind::Google, "client-id")
        .with_profile_url(mock_url(&server, "/v1/userinfo"));
    let provider = build_provider(config, deps()).unwrap();

    let claims = resolve(provider.as_ref()).await.unwrap();
    assert_eq!(claims.subject, "1094");
    assert_eq!(claims.issuer, "https://accounts.google.com");
    assert!(claims.email_verified);
    assert_eq!(claims.locale, "");
}

#[tokio::test]
async fn test_generic_claims_via_discovery() {
    let server = MockServer::start().await;
    mount_discovery(&server, &server.uri()).await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sub": "u-42",
            "email": "u42@corp.example.com",
            "email_verified": "True",
            "locale": "fr-FR"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = build_provider(generic(&server), deps()).unwrap();

    let claims = resolve(provider.as_ref()).await.unwrap();
    assert_eq!(claims.subject, "u-42");
    assert_eq!(claims.issuer, server.uri());
    assert!(claims.email_verified);
    assert_eq!(claims.locale, "fr-FR");

    let settings = provider.oauth2(&RequestContext::new()).await.unwrap();
    assert_eq!(settings.endpoint.auth_url, mock_url(&server, "/authorize"));
    assert_eq!(settings.endpoint.token_url, mock_url(&server, "/token"));
}

#[tokio::test]
async fn test_generic_issuer_mismatch_is_configuration_error() {
    let server = MockServer::start().await;
    mount_discovery(&server, "https://other-issuer.example.com").await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = build_provider(generic(&server), deps()).unwrap();

    let err = resolve(provider.as_ref()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_generic_discovery_failure_is_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(502))
        .expect(4)
        .mount(&server)
        .await;

    let provider = build_provider(generic(&server), deps()).unwrap();

    let err = resolve(provider.as_ref()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert_eq!(err.upstream_status(), Some(502));
}
