//! Name-to-constructor registry for embedding providers.

use super::embedder::{EmbeddingBackend, EmbeddingProvider, HttpEmbeddingProvider};
use super::{RagError, Result};
use crate::config::RagConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds an embedding provider from RAG configuration.
pub type ProviderConstructor =
    Arc<dyn Fn(&RagConfig) -> Arc<dyn EmbeddingProvider> + Send + Sync>;

/// Registry for looking up embedding providers by configured name.
///
/// [`ProviderRegistry::new`] knows `openai`, `voyageai` and `voyage`. Additional
/// providers are added with [`register`](Self::register); lookup never changes.
///
/// # Example
///
/// ```
/// # use platformai_core::rag::{HttpEmbeddingProvider, ProviderRegistry};
/// # use std::sync::Arc;
/// let mut registry = ProviderRegistry::new();
/// registry.register("azure-openai", |config| {
///     Arc::new(
///         HttpEmbeddingProvider::openai(config.api_key.clone(), config.model.as_deref())
///             .with_base_url("https://example.openai.azure.com"),
///     )
/// });
/// assert!(registry.contains("azure-openai"));
/// ```
#[derive(Clone)]
pub struct ProviderRegistry {
    constructors: HashMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    /// Creates a registry with the built-in HTTP providers.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("openai", http_constructor(EmbeddingBackend::OpenAi));
        registry.register("voyageai", http_constructor(EmbeddingBackend::Voyage));
        registry.register("voyage", http_constructor(EmbeddingBackend::Voyage));
        registry
    }

    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registers a constructor, replacing any existing one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&RagConfig) -> Arc<dyn EmbeddingProvider> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the provider selected by `config.embedding_provider`.
    pub fn create(&self, config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
        let constructor = self.constructors.get(&config.embedding_provider).ok_or_else(|| {
            RagError::Configuration(format!(
                "unsupported embedding provider: {} (supported: {})",
                config.embedding_provider,
                self.names().join(", ")
            ))
        })?;

        if config.api_key.is_empty() {
            return Err(RagError::Configuration(format!(
                "API key is required for embedding provider {}",
                config.embedding_provider
            )));
        }

        Ok(constructor(config))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn http_constructor(
    backend: EmbeddingBackend,
) -> impl Fn(&RagConfig) -> Arc<dyn EmbeddingProvider> + Send + Sync + 'static {
    move |config| {
        let mut provider =
            HttpEmbeddingProvider::new(backend, config.api_key.clone(), config.model.as_deref())
                .with_timeout(config.timeout());
        if let Some(base_url) = &config.base_url {
            provider = provider.with_base_url(base_url);
        }
        Arc::new(provider)
    }
}
