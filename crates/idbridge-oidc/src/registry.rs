//! Lookup of configured providers by ID.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::provider::{Dependencies, Provider, build_provider};

/// Immutable set of configured providers.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one adapter per configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid or two share an ID.
    pub fn from_configs(
        configs: impl IntoIterator<Item = ProviderConfig>,
        deps: &Dependencies,
    ) -> Result<Self, ProviderError> {
        let mut registry = Self::new();
        for config in configs {
            let provider = build_provider(config, deps.clone())?;
            registry.register(provider)?;
        }

        tracing::info!(
            providers = registry.len(),
            "Identity provider registry initialized"
        );
        Ok(registry)
    }

    /// Adds a provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Duplicate`] if the ID is already registered.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<(), ProviderError> {
        let id = provider.id().to_string();
        if self.providers.contains_key(&id) {
            return Err(ProviderError::Duplicate(id));
        }

        tracing::debug!(provider = %id, kind = %provider.config().provider, "Registered identity provider");
        self.providers.insert(id, provider);
        Ok(())
    }

    /// Returns the provider with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if no such provider is configured.
    pub fn get(&self, id: &str) -> Result<Arc<dyn Provider>, ProviderError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }

    /// Returns the configured IDs, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use url::Url;

    use super::*;
    use crate::claims::Claims;
    use crate::config::ProviderKind;
    use crate::context::{AuthFlowContext, RequestContext};
    use crate::error::ClaimsError;
    use crate::fetch::HttpClientFactory;
    use crate::oauth2::{AuthCodeOption, OAuth2Settings, OAuth2Token};
    use crate::provider::CallbackQuery;

    struct StubProvider {
        config: ProviderConfig,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn config(&self) -> &ProviderConfig {
            &self.config
        }

        async fn oauth2(&self, _ctx: &RequestContext) -> Result<OAuth2Settings, ProviderError> {
            Err(ProviderError::configuration("stub"))
        }

        fn auth_code_url_options(&self, _flow: &AuthFlowContext) -> Vec<AuthCodeOption> {
            Vec::new()
        }

        async fn claims(
            &self,
            _ctx: &RequestContext,
            _token: &OAuth2Token,
            _query: &CallbackQuery,
        ) -> Result<Claims, ClaimsError> {
            Ok(Claims::new("stub-user", "https://stub"))
        }
    }

    fn stub(id: &str) -> Arc<dyn Provider> {
        Arc::new(StubProvider {
            config: ProviderConfig::new(id, ProviderKind::Generic, "client"),
        })
    }

    fn deps() -> Dependencies {
        Dependencies::new(HttpClientFactory::with_defaults().unwrap())
            .with_redirect_base(Url::parse("https://id.example.com").unwrap())
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let mut registry = ProviderRegistry::new();
        registry.register(stub("b")).unwrap();
        registry.register(stub("a")).unwrap();

        assert_eq!(registry.ids(), vec!["a", "b"]);
        assert_eq!(registry.len(), 2);

        let provider = registry.get("a").unwrap();
        let claims = provider
            .claims(
                &RequestContext::new(),
                &OAuth2Token::bearer("t"),
                &CallbackQuery::new(),
            )
            .await
            .unwrap();
        assert_eq!(claims.subject, "stub-user");
    }

    #[test]
    fn test_unknown_provider() {
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get("missing"),
            Err(ProviderError::NotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ProviderRegistry::new();
        registry.register(stub("a")).unwrap();
        assert!(matches!(
            registry.register(stub("a")),
            Err(ProviderError::Duplicate(_))
        ));
    }

    #[test]
    fn test_from_configs() {
        let registry = ProviderRegistry::from_configs(
            vec![
                ProviderConfig::new("linkedin", ProviderKind::LinkedIn, "li-client"),
                ProviderConfig::new("google", ProviderKind::Google, "g-client"),
            ],
            &deps(),
        )
        .unwrap();
        assert_eq!(registry.ids(), vec!["google", "linkedin"]);
        assert!(format!("{registry:?}").contains("linkedin"));

        let result = ProviderRegistry::from_configs(
            vec![
                ProviderConfig::new("dup", ProviderKind::LinkedIn, "a"),
                ProviderConfig::new("dup", ProviderKind::Google, "b"),
            ],
            &deps(),
        );
        assert!(matches!(result, Err(ProviderError::Duplicate(_))));

        let result = ProviderRegistry::from_configs(
            vec![ProviderConfig::new("x", ProviderKind::Google, "")],
            &deps(),
        );
        assert!(result.unwrap_err().is_configuration_error());
    }
}
