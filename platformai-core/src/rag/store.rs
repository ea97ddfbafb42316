//! In-memory vector storage and search.
//!
//! The store keeps every document in a map keyed by ID behind a single
//! reader/writer lock. Searches are a linear cosine-similarity scan, which is
//! fine for tens of thousands of documents and nothing more.

use super::types::{Document, SearchResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors returned by vector store operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The caller supplied a structurally invalid document or query.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No document exists with the given ID.
    #[error("document not found: {0}")]
    NotFound(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage and similarity search over embedded documents.
///
/// Writers (`add`, `add_batch`, `delete`, `clear`) take exclusive access;
/// readers (`search`, `get`, `count`) may run in parallel.
pub trait VectorStore: Send + Sync {
    /// Inserts a document, replacing any existing entry with the same ID.
    fn add(&self, document: Document) -> Result<()>;

    /// Inserts every document or none of them.
    fn add_batch(&self, documents: Vec<Document>) -> Result<()>;

    /// Ranks stored documents by cosine similarity to `query_embedding`.
    ///
    /// Only scores `>= min_score` are kept. A `top_k` of zero returns every
    /// qualifying result.
    fn search(&self, query_embedding: &[f32], top_k: usize, min_score: f32)
        -> Result<Vec<SearchResult>>;

    /// Returns an owned copy of the stored document.
    fn get(&self, id: &str) -> Result<Document>;

    fn delete(&self, id: &str) -> Result<()>;

    fn count(&self) -> usize;

    /// Removes all documents from the store.
    fn clear(&self);
}

/// An in-memory vector store for document embeddings.
///
/// Cloning is cheap and clones share the same underlying map, so one store can
/// be handed to several retrievers or threads.
///
/// # Example
///
/// ```
/// # use platformai_core::rag::{Document, InMemoryVectorStore, VectorStore};
/// let store = InMemoryVectorStore::new();
/// store.add(Document::new("a", "cats", vec![1.0, 0.0, 0.0])).unwrap();
/// store.add(Document::new("b", "dogs", vec![0.0, 1.0, 0.0])).unwrap();
///
/// let results = store.search(&[1.0, 0.0, 0.0], 1, 0.0).unwrap();
/// assert_eq!(results[0].document.id, "a");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorStore {
    documents: Arc<RwLock<HashMap<String, Document>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn validate(document: &Document) -> Result<()> {
    if document.id.is_empty() {
        return Err(StoreError::Validation("document ID is required".to_string()));
    }
    if document.embedding.is_empty() {
        return Err(StoreError::Validation(format!(
            "document embedding is required (id: {})",
            document.id
        )));
    }
    Ok(())
}

impl VectorStore for InMemoryVectorStore {
    fn add(&self, document: Document) -> Result<()> {
        validate(&document)?;

        let mut docs = self.documents.write();
        docs.insert(document.id.clone(), document);
        Ok(())
    }

    fn add_batch(&self, documents: Vec<Document>) -> Result<()> {
        for (index, document) in documents.iter().enumerate() {
            validate(document).map_err(|e| match e {
                StoreError::Validation(msg) => {
                    StoreError::Validation(format!("batch item {}: {}", index, msg))
                }
                other => other,
            })?;
        }

        let mut docs = self.documents.write();
        let added = documents.len();
        for document in documents {
            docs.insert(document.id.clone(), document);
        }
        debug!(added, total = docs.len(), "Committed document batch");
        Ok(())
    }

    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        if query_embedding.is_empty() {
            return Err(StoreError::Validation("query embedding is required".to_string()));
        }

        let docs = self.documents.read();

        let mut scored: Vec<(f32, &Document)> = docs
            .values()
            .map(|doc| (cosine_similarity(query_embedding, &doc.embedding), doc))
            .filter(|(score, _)| *score >= min_score)
            .collect();

        // Descending score, ties by ascending ID so results are deterministic.
        scored.sort_by(|(score_a, doc_a), (score_b, doc_b)| {
            score_b.total_cmp(score_a).then_with(|| doc_a.id.cmp(&doc_b.id))
        });

        if top_k > 0 {
            scored.truncate(top_k);
        }

        debug!(
            scanned = docs.len(),
            returned = scored.len(),
            top_k,
            min_score,
            "Vector search complete"
        );

        Ok(scored
            .into_iter()
            .map(|(score, doc)| SearchResult {
                document: doc.clone(),
                score,
            })
            .collect())
    }

    fn get(&self, id: &str) -> Result<Document> {
        self.documents
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.documents
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn count(&self) -> usize {
        self.documents.read().len()
    }

    fn clear(&self) {
        self.documents.write().clear();
    }
}

/// Computes cosine similarity between two vectors.
///
/// Returns values from -1.0 (opposite) to 1.0 (identical), with 0.0 for
/// orthogonal vectors. Mismatched lengths and zero-magnitude vectors score
/// exactly 0.0 rather than erroring. Accumulation happens in `f64`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, norm_a, norm_b), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (dot + x * y, norm_a + x * x, norm_b + y * y)
        },
    );

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}
