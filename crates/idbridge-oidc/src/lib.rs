//! # idbridge-oidc
//!
//! Provider abstraction and claims normalization for OpenID Connect / OAuth 2.0
//! logins.
//!
//! Given a completed token exchange for a configured provider, this crate
//! produces one canonical [`Claims`] record, whatever the provider's own
//! profile API looks like.
//!
//! ## Modules
//!
//! - [`provider`] - The [`Provider`] contract and the LinkedIn, Google and
//!   generic OIDC adapters
//! - [`registry`] - Lookup of configured providers by ID
//! - [`fetch`] - Retrying, traced JSON fetching from upstream APIs
//! - [`discovery`] - OpenID Connect discovery documents
//! - [`claims`] - The canonical identity record
//! - [`boolean`] - Normalization of boolean-like upstream values
//! - [`oauth2`] - Authorization-code flow settings and tokens
//! - [`context`] - Cancellation and deadlines for a single request
//! - [`config`] - Per-provider configuration
//! - [`error`] - Error types and the claims error boundary
//!
//! ## Example
//!
//! ```ignore
//! use idbridge_oidc::prelude::*;
//!
//! let deps = Dependencies::new(HttpClientFactory::with_defaults()?)
//!     .with_redirect_base("https://id.example.com".parse()?);
//! let registry = ProviderRegistry::from_configs(configs, &deps)?;
//!
//! let provider = registry.get("linkedin")?;
//! let claims = provider
//!     .claims(&RequestContext::new(), &token, &CallbackQuery::new())
//!     .await?;
//! ```

pub mod boolean;
pub mod claims;
pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod oauth2;
pub mod provider;
pub mod registry;

pub use boolean::{ConvertibleBoolean, normalize_bool};
pub use claims::{Claims, ClaimsValidationError};
pub use config::{CALLBACK_PATH, ProviderConfig, ProviderKind};
pub use context::{AuthFlowContext, RequestContext};
pub use error::{ClaimsError, ErrorKind, FetchError, GENERIC_ERROR_MESSAGE, ProviderError};
pub use fetch::{AuthenticatedClient, HttpClientConfig, HttpClientFactory, RetryPolicy, fetch_json};
pub use oauth2::{AuthCodeOption, Endpoint, OAuth2Settings, OAuth2Token};
pub use provider::{CallbackQuery, Dependencies, Provider, build_provider};
pub use registry::ProviderRegistry;

/// Commonly used types.
pub mod prelude {
    pub use crate::claims::Claims;
    pub use crate::config::{ProviderConfig, ProviderKind};
    pub use crate::context::{AuthFlowContext, RequestContext};
    pub use crate::error::{ClaimsError, ErrorKind, ProviderError};
    pub use crate::fetch::{HttpClientConfig, HttpClientFactory};
    pub use crate::oauth2::{OAuth2Settings, OAuth2Token};
    pub use crate::provider::{CallbackQuery, Dependencies, Provider};
    pub use crate::registry::ProviderRegistry;
}
