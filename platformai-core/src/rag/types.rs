use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A document stored in the vector store.
///
/// Documents are the unit of retrieval. Each one carries the original text,
/// the embedding computed for that text, and free-form string metadata
/// (`title` and `source` are rendered into the retrieval context when present).
///
/// # Example
///
/// ```
/// # use platformai_core::rag::Document;
/// let doc = Document::new("k8s-resources", "Always set resource limits", vec![0.1, 0.2, 0.3])
///     .with_metadata("source", "k8s-guide")
///     .with_metadata("title", "Resources");
/// assert_eq!(doc.metadata.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
            embedding,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Caller-supplied record for ingestion; the embedding is computed by the retriever.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl DocumentInput {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A search result containing a document and its similarity score.
///
/// # Score Range
///
/// Cosine similarity ranges from -1.0 to 1.0:
/// - `1.0` - same direction (perfect match)
/// - `0.0` - orthogonal, zero-norm, or dimension-mismatched vectors
/// - `-1.0` - opposite direction
///
/// Text embeddings almost always land between 0.0 and 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

/// Number of results returned when a request asks for zero.
pub const DEFAULT_TOP_K: usize = 3;

/// Request to retrieve documents relevant to a query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    /// Zero falls back to [`DEFAULT_TOP_K`].
    #[serde(default)]
    pub top_k: usize,
    /// Inclusive similarity floor.
    #[serde(default)]
    pub min_score: f32,
}

impl RetrieveRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            min_score: 0.0,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

/// Ranked results plus the prompt-ready context built from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub results: Vec<SearchResult>,
    pub context: String,
    /// Embedding computed for the query, exposed for callers that cache it.
    pub query_embedding: Vec<f32>,
}
