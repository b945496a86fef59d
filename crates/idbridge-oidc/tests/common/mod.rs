//! Shared fixtures for upstream-mocked provider tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use idbridge_oidc::{
    Dependencies, HttpClientConfig, HttpClientFactory, Provider, ProviderConfig, ProviderKind,
    RetryPolicy, build_provider,
};
use url::Url;
use wiremock::MockServer;

pub const ACCESS_TOKEN: &str = "token-123";

pub const REDIRECT_BASE: &str = "https://id.example.com";

/// Retries with near-zero backoff so failing scenarios finish quickly.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        min_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

pub fn deps_with_retry(retry: RetryPolicy) -> Dependencies {
    let http = HttpClientFactory::new(
        HttpClientConfig::default()
            .with_allow_http(true)
            .with_retry(retry),
    )
    .unwrap();

    Dependencies::new(http).with_redirect_base(Url::parse(REDIRECT_BASE).unwrap())
}

pub fn deps() -> Dependencies {
    deps_with_retry(fast_retry())
}

pub fn mock_url(server: &MockServer, path: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), path)).unwrap()
}

pub fn linkedin(server: &MockServer, deps: Dependencies) -> Arc<dyn Provider> {
    linkedin_at(mock_url(server, "/v2/userinfo"), deps)
}

pub fn linkedin_at(profile_url: Url, deps: Dependencies) -> Arc<dyn Provider> {
    let config = ProviderConfig::new("linkedin", ProviderKind::LinkedIn, "client-id")
        .with_client_secret("client-secret")
        .with_scope(vec!["openid", "profile", "email"])
        .with_profile_url(profile_url);
    build_provider(config, deps).unwrap()
}
