//! Resilient upstream fetching.
//!
//! All profile and discovery requests go through [`fetch_json`], which wraps a
//! retrying GET in an `oidc.fetch` tracing span and classifies failures:
//!
//! - transport errors and 5xx/429 responses are retried with exponential
//!   backoff, up to [`RetryPolicy::max_retries`] times
//! - any other non-2xx response, or a retryable one after the budget, becomes
//!   [`FetchError::Upstream`]
//! - a 2xx body that does not decode becomes [`FetchError::Malformed`] and is
//!   never retried
//!
//! Every attempt and every backoff sleep observes the [`RequestContext`].

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use url::Url;

use crate::context::RequestContext;
use crate::error::{FetchError, ProviderError};
use crate::oauth2::OAuth2Token;

/// Longest upstream error body excerpt written to the logs.
const ERROR_BODY_SNIPPET_LEN: usize = 256;

/// Bytes of an error body read off the wire; enough for the snippet in any
/// UTF-8 encoding.
const ERROR_BODY_READ_LIMIT: usize = ERROR_BODY_SNIPPET_LEN * 4;

/// Retry budget and backoff bounds for upstream requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    #[serde(with = "humantime_serde")]
    pub min_backoff: Duration,

    /// Upper bound for any single delay.
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero-based): `min_backoff * 2^retry`,
    /// capped at `max_backoff`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.min_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

fn default_user_agent() -> String {
    format!("idbridge/{}", env!("CARGO_PKG_VERSION"))
}

/// HTTP client settings shared by every provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Timeout for a single request attempt (default: 10 seconds).
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// `User-Agent` sent upstream.
    pub user_agent: String,

    /// Retry behavior.
    pub retry: RetryPolicy,

    /// Maximum response size in bytes (default: 1 MB).
    pub max_response_size: usize,

    /// Whether to allow plain HTTP upstream URLs.
    /// This should only be enabled for testing.
    pub allow_http: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            user_agent: default_user_agent(),
            retry: RetryPolicy::default(),
            max_response_size: 1024 * 1024,
            allow_http: false,
        }
    }
}

impl HttpClientConfig {
    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the per-attempt request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Allows plain HTTP upstream URLs.
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }
}

/// Produces request-scoped HTTP clients over one shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    client: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpClientFactory {
    /// Builds the underlying `reqwest` client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the client cannot be built.
    pub fn new(config: HttpClientConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProviderError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Builds a factory with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the client cannot be built.
    pub fn with_defaults() -> Result<Self, ProviderError> {
        Self::new(HttpClientConfig::default())
    }

    /// Wraps an existing client. `config.request_timeout` and
    /// `config.user_agent` are not applied to it.
    #[must_use]
    pub fn from_client(client: reqwest::Client, config: HttpClientConfig) -> Self {
        Self { client, config }
    }

    /// Returns the settings.
    #[must_use]
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// A client that sends `token` as a bearer credential.
    #[must_use]
    pub fn authenticated(&self, ctx: &RequestContext, token: &OAuth2Token) -> AuthenticatedClient {
        self.build(ctx, Some(token.access_token.clone()))
    }

    /// A client without credentials, for discovery documents.
    #[must_use]
    pub fn unauthenticated(&self, ctx: &RequestContext) -> AuthenticatedClient {
        self.build(ctx, None)
    }

    fn build(&self, ctx: &RequestContext, bearer: Option<String>) -> AuthenticatedClient {
        AuthenticatedClient {
            client: self.client.clone(),
            ctx: ctx.clone(),
            bearer,
            retry: self.config.retry,
            max_response_size: self.config.max_response_size,
            allow_http: self.config.allow_http,
        }
    }
}

/// An HTTP client bound to one request context and, optionally, one token.
pub struct AuthenticatedClient {
    client: reqwest::Client,
    ctx: RequestContext,
    bearer: Option<String>,
    retry: RetryPolicy,
    max_response_size: usize,
    allow_http: bool,
}

impl AuthenticatedClient {
    /// Returns the request context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    /// Performs a GET with retries and returns the raw 2xx body.
    ///
    /// Records `attempts` and `http.status_code` on the current span.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL scheme is not HTTPS (unless `allow_http` is configured)
    /// - The context is cancelled or its deadline expires
    /// - The upstream is unreachable or answers non-2xx after the retry budget
    /// - The body exceeds the maximum response size
    pub async fn get(&self, provider: &str, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.validate_scheme(url)?;

        let span = tracing::Span::current();
        let mut retry = 0u32;

        loop {
            self.ctx.check()?;
            span.record("attempts", retry + 1);

            let mut request = self
                .client
                .get(url.clone())
                .header(ACCEPT, "application/json");
            if let Some(token) = &self.bearer {
                request = request.bearer_auth(token);
            }

            match self.ctx.run(request.send()).await? {
                Ok(response) => {
                    let status = response.status();
                    span.record("http.status_code", status.as_u16());

                    if status.is_success() {
                        return self.read_body(provider, response).await;
                    }

                    if !is_retryable_status(status) || retry >= self.retry.max_retries {
                        let body = self.ctx.run(error_body(response)).await?;
                        tracing::warn!(
                            provider = %provider,
                            status = status.as_u16(),
                            body = %snippet(&body),
                            "Upstream returned an error response"
                        );
                        return Err(FetchError::upstream(provider, status.as_u16()));
                    }

                    tracing::debug!(
                        provider = %provider,
                        status = status.as_u16(),
                        retry = retry + 1,
                        "Retrying upstream request after error status"
                    );
                }
                Err(err) => {
                    if !is_retryable_error(&err) || retry >= self.retry.max_retries {
                        tracing::warn!(provider = %provider, error = %err, "Upstream request failed");
                        return Err(FetchError::Network {
                            provider: provider.to_string(),
                            source: err,
                        });
                    }

                    tracing::debug!(
                        provider = %provider,
                        error = %err,
                        retry = retry + 1,
                        "Retrying upstream request after transport error"
                    );
                }
            }

            self.ctx
                .run(tokio::time::sleep(self.retry.backoff(retry)))
                .await?;
            retry += 1;
        }
    }

    async fn read_body(
        &self,
        provider: &str,
        response: reqwest::Response,
    ) -> Result<Vec<u8>, FetchError> {
        if let Some(len) = response.content_length()
            && len > self.max_response_size as u64
        {
            return Err(self.too_large(provider));
        }

        let body = self
            .ctx
            .run(response.bytes())
            .await?
            .map_err(|source| FetchError::Network {
                provider: provider.to_string(),
                source,
            })?;

        if body.len() > self.max_response_size {
            return Err(self.too_large(provider));
        }

        Ok(body.to_vec())
    }

    fn too_large(&self, provider: &str) -> FetchError {
        FetchError::malformed(
            provider,
            format!(
                "response exceeds maximum size of {} bytes",
                self.max_response_size
            ),
        )
    }

    fn validate_scheme(&self, url: &Url) -> Result<(), FetchError> {
        match url.scheme() {
            "https" => Ok(()),
            "http" if self.allow_http => Ok(()),
            scheme => Err(FetchError::InvalidRequest(format!(
                "URL scheme '{scheme}' is not allowed, only HTTPS is"
            ))),
        }
    }
}

impl fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("ctx", &self.ctx)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field("retry", &self.retry)
            .field("max_response_size", &self.max_response_size)
            .field("allow_http", &self.allow_http)
            .finish_non_exhaustive()
    }
}

/// Fetches `url` and decodes the JSON body into `T`.
///
/// Runs inside an `oidc.fetch` span carrying the provider, the URL without
/// query string, the final status code, the attempt count and any error.
///
/// # Errors
///
/// See [`AuthenticatedClient::get`]. A body that does not decode into `T`
/// yields [`FetchError::Malformed`].
pub async fn fetch_json<T>(
    client: &AuthenticatedClient,
    provider: &str,
    url: &Url,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let span = tracing::info_span!(
        "oidc.fetch",
        provider = %provider,
        http.url = %loggable_url(url),
        http.status_code = tracing::field::Empty,
        attempts = tracing::field::Empty,
        error = tracing::field::Empty,
    );

    let result = async {
        let body = client.get(provider, url).await?;
        serde_json::from_slice::<T>(&body).map_err(|e| {
            tracing::warn!(provider = %provider, error = %e, "Failed to decode upstream response");
            FetchError::malformed(provider, e.to_string())
        })
    }
    .instrument(span.clone())
    .await;

    if let Err(err) = &result {
        span.record("error", tracing::field::display(err));
    }

    result
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Connect failures, timeouts and connections dropped mid-exchange. Builder
/// errors never reach the wire and are not retried.
fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || (err.is_request() && !err.is_builder())
}

/// Reads at most `ERROR_BODY_READ_LIMIT` bytes of an error response for logging.
async fn error_body(mut response: reqwest::Response) -> String {
    let mut buf = Vec::new();
    while buf.len() < ERROR_BODY_READ_LIMIT {
        match response.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    buf.truncate(ERROR_BODY_READ_LIMIT);
    String::from_utf8_lossy(&buf).into_owned()
}

/// URL with query and fragment removed, which may carry secrets.
fn loggable_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url
}

fn snippet(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_SNIPPET_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
