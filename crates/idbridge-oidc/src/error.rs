//! Error types for identity provider operations.
//!
//! Errors are layered:
//!
//! - [`FetchError`] - failures of a single resilient profile/discovery fetch
//! - [`ProviderError`] - failures inside an adapter, carrying full upstream detail
//! - [`ClaimsError`] - the only error handed back from
//!   [`Provider::claims`](crate::provider::Provider::claims)
//!
//! A [`ClaimsError`] never displays upstream detail. Its `Display` output is a
//! generic internal-server-error message suitable for the login error surface,
//! while [`ClaimsError::kind`], [`ClaimsError::reason`] and the `source()` chain
//! keep the original failure available to operators.

use std::fmt;

use crate::claims::ClaimsValidationError;

/// Message shown to end users for any failure on the claims path.
pub const GENERIC_ERROR_MESSAGE: &str =
    "An internal server error occurred, please contact the system administrator";

/// Errors produced by the resilient fetcher.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be built or was refused before sending.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A transport-level failure (connect, timeout, TLS) after retries.
    #[error("Network error talking to {provider}: {source}")]
    Network {
        /// The provider ID the request was made for.
        provider: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with a non-success status code.
    #[error("Upstream {provider} responded with HTTP {status}")]
    Upstream {
        /// The provider ID the request was made for.
        provider: String,
        /// The HTTP status code returned by the upstream.
        status: u16,
    },

    /// The upstream answered 2xx but the body is not the expected shape.
    #[error("Malformed response from {provider}: {message}")]
    Malformed {
        /// The provider ID the request was made for.
        provider: String,
        /// Description of the decoding failure.
        message: String,
    },

    /// The request context was cancelled.
    #[error("Request was cancelled")]
    Cancelled,

    /// The request context deadline expired.
    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

impl FetchError {
    /// Creates an `Upstream` error.
    #[must_use]
    pub fn upstream(provider: impl Into<String>, status: u16) -> Self {
        Self::Upstream {
            provider: provider.into(),
            status,
        }
    }

    /// Creates a `Malformed` error.
    #[must_use]
    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns the upstream HTTP status, if the upstream answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the request was aborted by its context.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::Internal,
            Self::Network { .. } | Self::Upstream { .. } => ErrorKind::UpstreamUnavailable,
            Self::Malformed { .. } => ErrorKind::MalformedUpstreamResponse,
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancelled,
        }
    }
}

/// Errors that can occur inside a provider adapter or the registry.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The requested provider is not configured.
    #[error("Identity provider not found: {0}")]
    NotFound(String),

    /// Two providers were configured with the same ID.
    #[error("Duplicate identity provider id: {0}")]
    Duplicate(String),

    /// The provider configuration is invalid or incomplete.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A configured or built-in URL could not be parsed.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Fetching from the upstream failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The upstream profile decoded but does not identify a principal.
    #[error("Invalid profile from {provider}: {source}")]
    InvalidProfile {
        /// The provider ID.
        provider: String,
        /// Why the mapped claims were rejected.
        #[source]
        source: ClaimsValidationError,
    },
}

impl ProviderError {
    /// Creates a `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns `true` if this is a provider setup error.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Duplicate(_) | Self::Configuration(_) | Self::Url(_)
        )
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::Duplicate(_) | Self::Configuration(_) | Self::Url(_) => {
                ErrorKind::Configuration
            }
            Self::Fetch(err) => err.kind(),
            Self::InvalidProfile { .. } => ErrorKind::MalformedUpstreamResponse,
        }
    }
}

/// Classification of a claims failure, for logging, metrics and flow decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// OAuth2 settings could not be constructed.
    Configuration,
    /// The upstream failed or was unreachable after the retry budget.
    UpstreamUnavailable,
    /// The upstream answered with data that does not fit the expected schema.
    MalformedUpstreamResponse,
    /// The caller cancelled the request or its deadline expired.
    Cancelled,
    /// Any other local failure.
    Internal,
}

impl ErrorKind {
    /// Returns a stable snake_case name for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::MalformedUpstreamResponse => "malformed_upstream_response",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned to the orchestrator by [`Provider::claims`](crate::provider::Provider::claims).
///
/// Displays only [`GENERIC_ERROR_MESSAGE`]. Use [`reason`](Self::reason) or the
/// `source()` chain for operator-facing detail.
#[derive(Debug)]
pub struct ClaimsError {
    kind: ErrorKind,
    provider: String,
    source: ProviderError,
}

impl ClaimsError {
    /// Classifies a provider error at the claims boundary.
    ///
    /// The full detail is logged here, on the current span, so that callers
    /// only ever need the generic message.
    #[must_use]
    pub fn from_provider_error(provider: impl Into<String>, source: ProviderError) -> Self {
        let provider = provider.into();
        let kind = source.kind();

        tracing::warn!(
            provider = %provider,
            error.kind = %kind,
            error.reason = %source,
            "Failed to resolve identity claims"
        );

        Self {
            kind,
            provider,
            source,
        }
    }

    /// Returns the classification of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the provider ID the failure originated from.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the internal failure detail. Never show this to end users.
    #[must_use]
    pub fn reason(&self) -> String {
        self.source.to_string()
    }

    /// Returns the underlying provider error.
    #[must_use]
    pub fn provider_error(&self) -> &ProviderError {
        &self.source
    }

    /// Returns the user-facing message.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        GENERIC_ERROR_MESSAGE
    }

    /// Returns the HTTP status the enclosing flow should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        500
    }

    /// Returns the upstream HTTP status, if the upstream answered.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match &self.source {
            ProviderError::Fetch(err) => err.status(),
            _ => None,
        }
    }
}

impl fmt::Display for ClaimsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(GENERIC_ERROR_MESSAGE)
    }
}

impl std::error::Error for ClaimsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::upstream("linkedin", 503);
        assert_eq!(err.to_string(), "Upstream linkedin responded with HTTP 503");
        assert_eq!(err.status(), Some(503));

        let err = FetchError::malformed("google", "expected value at line 1 column 1");
        assert!(err.to_string().contains("google"));
        assert!(err.to_string().contains("line 1"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_fetch_error_kinds() {
        assert_eq!(
            FetchError::upstream("x", 500).kind(),
            ErrorKind::UpstreamUnavailable
        );
        assert_eq!(
            FetchError::malformed("x", "bad").kind(),
            ErrorKind::MalformedUpstreamResponse
        );
        assert_eq!(FetchError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(FetchError::DeadlineExceeded.kind(), ErrorKind::Cancelled);
        assert!(FetchError::DeadlineExceeded.is_cancellation());
        assert!(!FetchError::upstream("x", 500).is_cancellation());
    }

    #[test]
    fn test_provider_error_kinds() {
        assert_eq!(
            ProviderError::configuration("redirect base missing").kind(),
            ErrorKind::Configuration
        );
        assert!(ProviderError::NotFound("x".to_string()).is_configuration_error());
        assert_eq!(
            ProviderError::from(FetchError::upstream("x", 502)).kind(),
            ErrorKind::UpstreamUnavailable
        );
        assert_eq!(
            ProviderError::InvalidProfile {
                provider: "x".to_string(),
                source: ClaimsValidationError::MissingSubject,
            }
            .kind(),
            ErrorKind::MalformedUpstreamResponse
        );
    }

    #[test]
    fn test_claims_error_hides_upstream_detail() {
        let err = ClaimsError::from_provider_error(
            "linkedin",
            ProviderError::from(FetchError::upstream("linkedin", 500)),
        );

        assert_eq!(err.to_string(), GENERIC_ERROR_MESSAGE);
        assert!(!err.to_string().contains("linkedin"));
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        assert_eq!(err.provider(), "linkedin");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.upstream_status(), Some(500));
        assert!(err.reason().contains("HTTP 500"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Configuration.to_string(), "configuration");
        assert_eq!(
            ErrorKind::MalformedUpstreamResponse.to_string(),
            "malformed_upstream_response"
        );
    }
}
