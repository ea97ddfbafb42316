//! Retrieval Augmented Generation (RAG) system.
//!
//! This module implements a small RAG pipeline for enriching LLM prompts with
//! relevant context from an in-memory knowledge base.
//!
//! # Architecture
//!
//! - [`EmbeddingProvider`]: converts text to vectors through a hosted embedding API
//! - [`VectorStore`]: thread-safe document map with cosine-similarity search
//! - [`Retriever`]: embeds documents and queries, searches, and formats context
//! - [`RagModule`]: wires a configured provider, a store, and a retriever together
//!
//! # How It Works
//!
//! 1. **Ingestion**: each document's content is embedded and stored under its ID
//!    (re-adding an ID replaces the previous entry).
//! 2. **Retrieval**: the query is embedded, every stored document is scored by
//!    cosine similarity, results below `min_score` are dropped, and the best
//!    `top_k` are kept.
//! 3. **Augmentation**: the ranked results are rendered into a context block
//!    that the caller prepends to an LLM prompt.
//!
//! The store is a linear scan held in process memory. It is meant for at most
//! tens of thousands of documents.

mod embedder;
mod registry;
mod retriever;
mod store;
mod types;

pub use embedder::{
    EmbeddingBackend, EmbeddingError, EmbeddingProvider, HttpEmbeddingProvider, DEFAULT_TIMEOUT,
};
pub use registry::{ProviderConstructor, ProviderRegistry};
pub use retriever::{format_context, Retriever};
pub use store::{cosine_similarity, InMemoryVectorStore, StoreError, VectorStore};
pub use types::{
    Document, DocumentInput, RetrieveRequest, RetrieveResponse, SearchResult, DEFAULT_TOP_K,
};

use crate::config::RagConfig;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("failed to generate embedding: {0}")]
    Embedding(#[source] EmbeddingError),

    #[error("failed to generate embeddings: {0}")]
    BatchEmbedding(#[source] EmbeddingError),

    #[error("failed to generate query embedding: {0}")]
    QueryEmbedding(#[source] EmbeddingError),

    #[error("failed to add document: {0}")]
    Storage(#[source] StoreError),

    #[error("failed to add documents: {0}")]
    BatchStorage(#[source] StoreError),

    #[error("failed to search documents: {0}")]
    Search(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to create embedding provider: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

/// Broad classification of a [`RagError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structurally invalid input (missing ID, empty embedding, empty query embedding).
    Validation,
    /// Lookup or delete of an ID that is not stored.
    NotFound,
    /// The embedding API call failed.
    Provider,
    /// The module could not be built from its configuration.
    Configuration,
}

impl RagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Embedding(_) | Self::BatchEmbedding(_) | Self::QueryEmbedding(_) => {
                ErrorKind::Provider
            }
            Self::Storage(e) | Self::BatchStorage(e) | Self::Search(e) | Self::Store(e) => match e {
                StoreError::Validation(_) => ErrorKind::Validation,
                StoreError::NotFound(_) => ErrorKind::NotFound,
            },
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }
}

/// The RAG entry point exposed by the SDK.
///
/// `RagModule` is `Clone`; clones share the same knowledge base.
///
/// # Example
///
/// ```no_run
/// # use platformai_core::config::RagConfig;
/// # use platformai_core::rag::RagModule;
/// # use std::collections::HashMap;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rag = RagModule::new(&RagConfig::new("openai", "sk-..."))?;
///
/// rag.add_document(
///     "k8s-health",
///     "Implement liveness and readiness probes.",
///     HashMap::from([("source".to_string(), "k8s-guide".to_string())]),
/// )
/// .await?;
///
/// let context = rag.query("How do I configure health checks?", 2).await?;
/// println!("{context}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RagModule {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    retriever: Retriever,
    embedding_dim: Option<usize>,
}

impl RagModule {
    /// Creates a module using the built-in provider registry.
    pub fn new(config: &RagConfig) -> Result<Self> {
        Self::with_registry(config, &ProviderRegistry::new())
    }

    /// Creates a module, resolving the provider name through `registry`.
    pub fn with_registry(config: &RagConfig, registry: &ProviderRegistry) -> Result<Self> {
        let embedder = registry.create(config)?;
        info!(
            provider = %config.embedding_provider,
            model = config.model.as_deref().unwrap_or("default"),
            "RAG module initialized"
        );

        let mut module = Self::with_provider(embedder);
        module.embedding_dim = config.embedding_dim;
        Ok(module)
    }

    /// Creates a module around an already constructed provider and an empty store.
    pub fn with_provider(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
        let retriever = Retriever::new(Arc::clone(&embedder), Arc::clone(&store));

        Self {
            embedder,
            store,
            retriever,
            embedding_dim: None,
        }
    }

    pub async fn add_document(
        &self,
        id: &str,
        content: &str,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        self.retriever.add_document(id, content, metadata).await
    }

    pub async fn add_documents(&self, documents: Vec<DocumentInput>) -> Result<()> {
        self.retriever.add_documents(documents).await
    }

    pub async fn retrieve(&self, request: RetrieveRequest) -> Result<RetrieveResponse> {
        self.retriever.retrieve(request).await
    }

    /// Retrieves documents and returns only the formatted context.
    pub async fn query(&self, query: &str, top_k: usize) -> Result<String> {
        let response = self
            .retrieve(RetrieveRequest::new(query).with_top_k(top_k))
            .await?;
        Ok(response.context)
    }

    pub fn get_document(&self, id: &str) -> Result<Document> {
        Ok(self.store.get(id)?)
    }

    pub fn delete_document(&self, id: &str) -> Result<()> {
        Ok(self.store.delete(id)?)
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Configured embedding dimension. Advisory only; the store accepts any length.
    pub fn embedding_dim(&self) -> Option<usize> {
        self.embedding_dim
    }
}
