//! Retrieval pipeline: embed, store, search, and format context.

use super::embedder::{EmbeddingError, EmbeddingProvider};
use super::store::{StoreError, VectorStore};
use super::types::{
    Document, DocumentInput, RetrieveRequest, RetrieveResponse, SearchResult, DEFAULT_TOP_K,
};
use super::{RagError, Result};
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, info};

/// Bridges an [`EmbeddingProvider`] and a [`VectorStore`].
///
/// The retriever holds no documents itself. Every failure is returned to the
/// caller tagged with the stage that failed; nothing is retried.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Embeds `content` and stores it under `id`, replacing any previous entry.
    pub async fn add_document(
        &self,
        id: &str,
        content: &str,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        if id.is_empty() {
            return Err(RagError::Store(StoreError::Validation(
                "document ID is required".to_string(),
            )));
        }

        let embedding = self
            .embedder
            .embed(content)
            .await
            .map_err(RagError::Embedding)?;

        let document = Document {
            id: id.to_string(),
            content: content.to_string(),
            metadata,
            embedding,
        };

        self.store.add(document).map_err(RagError::Storage)?;
        debug!(id, "Document added");
        Ok(())
    }

    /// Embeds all documents with one batch call and stores them atomically.
    ///
    /// If the embedding call fails, or returns a different number of vectors
    /// than inputs, nothing is stored. If any document is invalid the store
    /// rejects the whole batch.
    pub async fn add_documents(&self, inputs: Vec<DocumentInput>) -> Result<()> {
        if let Some(index) = inputs.iter().position(|input| input.id.is_empty()) {
            return Err(RagError::Store(StoreError::Validation(format!(
                "batch item {}: document ID is required",
                index
            ))));
        }

        let contents: Vec<String> = inputs.iter().map(|input| input.content.clone()).collect();

        let embeddings = self
            .embedder
            .embed_batch(&contents)
            .await
            .map_err(RagError::BatchEmbedding)?;

        if embeddings.len() != inputs.len() {
            return Err(RagError::BatchEmbedding(EmbeddingError::CountMismatch {
                expected: inputs.len(),
                actual: embeddings.len(),
            }));
        }

        let documents: Vec<Document> = inputs
            .into_iter()
            .zip(embeddings)
            .map(|(input, embedding)| Document {
                id: input.id,
                content: input.content,
                metadata: input.metadata,
                embedding,
            })
            .collect();

        let count = documents.len();
        self.store.add_batch(documents).map_err(RagError::BatchStorage)?;
        info!(count, provider = self.embedder.name(), "Documents added to knowledge base");
        Ok(())
    }

    /// Finds the stored documents most similar to `request.query`.
    pub async fn retrieve(&self, request: RetrieveRequest) -> Result<RetrieveResponse> {
        let top_k = if request.top_k == 0 {
            DEFAULT_TOP_K
        } else {
            request.top_k
        };

        debug!(query = %request.query, top_k, min_score = request.min_score, "Retrieving context");

        let query_embedding = self
            .embedder
            .embed(&request.query)
            .await
            .map_err(RagError::QueryEmbedding)?;

        let results = self
            .store
            .search(&query_embedding, top_k, request.min_score)
            .map_err(RagError::Search)?;

        info!(results = results.len(), "Retrieved documents");

        let context = format_context(&results);
        Ok(RetrieveResponse {
            results,
            context,
            query_embedding,
        })
    }
}

/// Formats ranked results into a prompt-ready context block.
///
/// Returns an empty string when there are no results. Otherwise the format is:
///
/// ```text
/// Relevant context from knowledge base:
///
/// --- Document 1 (Relevance: 0.93) ---
/// Title: <metadata "title", if present>
/// Source: <metadata "source", if present>
///
/// <content>
///
/// --- Document 2 (Relevance: 0.81) ---
/// ...
/// ```
pub fn format_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut context = String::from("Relevant context from knowledge base:\n\n");

    for (i, result) in results.iter().enumerate() {
        let _ = writeln!(
            context,
            "--- Document {} (Relevance: {:.2}) ---",
            i + 1,
            result.score
        );

        let metadata = &result.document.metadata;
        if let Some(title) = metadata.get("title") {
            let _ = writeln!(context, "Title: {}", title);
        }
        if let Some(source) = metadata.get("source") {
            let _ = writeln!(context, "Source: {}", source);
        }

        context.push('\n');
        context.push_str(&result.document.content);
        context.push_str("\n\n");
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embedder;
    use crate::rag::{ErrorKind, InMemoryVectorStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Looks embeddings up from a fixed table; unknown texts map to `[0, 0, 1]`.
    struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
        calls: AtomicUsize,
        fail: bool,
        short_batch: bool,
        drops_last: bool,
    }

    impl TableEmbedder {
        fn new(entries: &[(&str, [f32; 3])]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(text, v)| (text.to_string(), v.to_vec()))
                    .collect(),
                calls: AtomicUsize::new(0),
                fail: false,
                short_batch: false,
                drops_last: false,
            }
        }

        fn lookup(&self, text: &str) -> Vec<f32> {
            if text.is_empty() {
                return Vec::new();
            }
            self.table
                .get(text)
                .cloned()
                .unwrap_or_else(|| vec![0.0, 0.0, 1.0])
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TableEmbedder {
        fn name(&self) -> &str {
            "table"
        }

        async fn embed(&self, text: &str) -> embedder::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EmbeddingError::NoEmbeddings);
            }
            Ok(self.lookup(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> embedder::Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EmbeddingError::Api {
                    provider: "openai",
                    status: 500,
                    body: "boom".into(),
                });
            }
            if self.short_batch {
                return Err(EmbeddingError::CountMismatch {
                    expected: texts.len(),
                    actual: texts.len() - 1,
                });
            }
            let mut vectors: Vec<_> = texts.iter().map(|t| self.lookup(t)).collect();
            if self.drops_last {
                vectors.pop();
            }
            Ok(vectors)
        }
    }

    fn retriever_with(embedder: TableEmbedder) -> (Retriever, InMemoryVectorStore, Arc<TableEmbedder>) {
        let store = InMemoryVectorStore::new();
        let embedder = Arc::new(embedder);
        let retriever = Retriever::new(embedder.clone(), Arc::new(store.clone()));
        (retriever, store, embedder)
    }

    fn sample_embedder() -> TableEmbedder {
        TableEmbedder::new(&[
            ("alpha", [1.0, 0.0, 0.0]),
            ("beta", [0.0, 1.0, 0.0]),
            ("gamma", [0.9, 0.1, 0.0]),
            ("query about alpha", [1.0, 0.0, 0.0]),
        ])
    }

    #[tokio::test]
    async fn test_add_document_embeds_and_stores() {
        let (retriever, store, _) = retriever_with(sample_embedder());
        let metadata = HashMap::from([("source".to_string(), "guide".to_string())]);

        retriever.add_document("a", "alpha", metadata.clone()).await.unwrap();

        let doc = store.get("a").unwrap();
        assert_eq!(doc.content, "alpha");
        assert_eq!(doc.metadata, metadata);
        assert_eq!(doc.embedding, vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_add_document_empty_id_skips_embedding() {
        let (retriever, store, embedder) = retriever_with(sample_embedder());

        let err = retriever.add_document("", "alpha", HashMap::new()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "validation failed: document ID is required");
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_add_document_provider_failure() {
        let mut embedder = sample_embedder();
        embedder.fail = true;
        let (retriever, store, _) = retriever_with(embedder);

        let err = retriever.add_document("a", "alpha", HashMap::new()).await.unwrap_err();

        assert!(matches!(err, RagError::Embedding(_)));
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(err.to_string().starts_with("failed to generate embedding"));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_add_documents_uses_one_batch_call_in_order() {
        let (retriever, store, embedder) = retriever_with(sample_embedder());

        retriever
            .add_documents(vec![
                DocumentInput::new("a", "alpha"),
                DocumentInput::new("b", "beta").with_metadata("title", "Beta"),
                DocumentInput::new("c", "gamma"),
            ])
            .await
            .unwrap();

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.count(), 3);
        assert_eq!(store.get("b").unwrap().embedding, vec![0.0, 1.0, 0.0]);
        assert_eq!(store.get("c").unwrap().embedding, vec![0.9, 0.1, 0.0]);
        assert_eq!(store.get("b").unwrap().metadata["title"], "Beta");
    }

    #[tokio::test]
    async fn test_add_documents_embedding_failure_stores_nothing() {
        let mut embedder = sample_embedder();
        embedder.short_batch = true;
        let (retriever, store, _) = retriever_with(embedder);

        let err = retriever
            .add_documents(vec![DocumentInput::new("a", "alpha"), DocumentInput::new("b", "beta")])
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::BatchEmbedding(EmbeddingError::CountMismatch { .. })));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_add_documents_short_provider_reply_stores_nothing() {
        let mut embedder = sample_embedder();
        embedder.drops_last = true;
        let (retriever, store, _) = retriever_with(embedder);

        let err = retriever
            .add_documents(vec![
                DocumentInput::new("a", "alpha"),
                DocumentInput::new("b", "beta"),
                DocumentInput::new("c", "gamma"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RagError::BatchEmbedding(EmbeddingError::CountMismatch { expected: 3, actual: 2 })
        ));
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(store.count(), 0);
        assert!(store.get("a").is_err());
    }

    #[tokio::test]
    async fn test_add_documents_store_rejection_names_batch_stage() {
        let (retriever, store, _) = retriever_with(sample_embedder());

        let err = retriever
            .add_documents(vec![DocumentInput::new("a", "alpha"), DocumentInput::new("e", "")])
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::BatchStorage(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().starts_with("failed to add documents: "));
        assert!(err.to_string().contains("batch item 1"));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_add_document_store_rejection_names_single_stage() {
        let (retriever, store, _) = retriever_with(sample_embedder());

        let err = retriever.add_document("e", "", HashMap::new()).await.unwrap_err();

        assert!(matches!(err, RagError::Storage(_)));
        assert!(err.to_string().starts_with("failed to add document: "));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_add_documents_invalid_id_rejects_batch() {
        let (retriever, store, embedder) = retriever_with(sample_embedder());

        let err = retriever
            .add_documents(vec![DocumentInput::new("a", "alpha"), DocumentInput::new("", "beta")])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_retrieve_ranks_and_formats() {
        let (retriever, _, _) = retriever_with(sample_embedder());
        retriever
            .add_documents(vec![
                DocumentInput::new("a", "alpha")
                    .with_metadata("title", "Alpha Guide")
                    .with_metadata("source", "docs/alpha.md"),
                DocumentInput::new("b", "beta"),
                DocumentInput::new("c", "gamma"),
            ])
            .await
            .unwrap();

        let response = retriever
            .retrieve(RetrieveRequest::new("query about alpha").with_top_k(2).with_min_score(0.5))
            .await
            .unwrap();

        let ids: Vec<_> = response.results.iter().map(|r| r.document.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(response.query_embedding, vec![1.0, 0.0, 0.0]);

        let context = &response.context;
        assert!(context.starts_with("Relevant context from knowledge base:"));
        assert!(context.contains("--- Document 1 (Relevance: 1.00) ---"));
        assert!(context.contains("--- Document 2 (Relevance: 0.99) ---"));

        let title = context.find("Title: Alpha Guide").unwrap();
        let source = context.find("Source: docs/alpha.md").unwrap();
        let alpha = context.find("\nalpha\n").unwrap();
        let gamma = context.find("\ngamma\n").unwrap();
        assert!(title < source && source < alpha && alpha < gamma);
        assert!(!context.contains("beta"));
    }

    #[tokio::test]
    async fn test_retrieve_zero_top_k_uses_default() {
        let (retriever, _, _) = retriever_with(sample_embedder());
        let inputs = (0..5).map(|i| DocumentInput::new(format!("d{i}"), "alpha")).collect();
        retriever.add_documents(inputs).await.unwrap();

        let response = retriever
            .retrieve(RetrieveRequest::new("alpha").with_top_k(0))
            .await
            .unwrap();

        assert_eq!(response.results.len(), DEFAULT_TOP_K);
    }

    #[tokio::test]
    async fn test_retrieve_empty_store_gives_empty_context() {
        let (retriever, _, _) = retriever_with(sample_embedder());

        let response = retriever.retrieve(RetrieveRequest::new("alpha")).await.unwrap();

        assert!(response.results.is_empty());
        assert!(response.context.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_query_embedding_failure() {
        let mut embedder = sample_embedder();
        embedder.fail = true;
        let (retriever, _, _) = retriever_with(embedder);

        let err = retriever.retrieve(RetrieveRequest::new("alpha")).await.unwrap_err();

        assert!(matches!(err, RagError::QueryEmbedding(_)));
        assert!(err.to_string().starts_with("failed to generate query embedding"));
    }

    #[test]
    fn test_format_context_without_metadata() {
        let results = vec![SearchResult {
            document: Document::new("x", "plain content", vec![1.0]),
            score: 0.876,
        }];

        let context = format_context(&results);
        assert_eq!(
            context,
            "Relevant context from knowledge base:\n\n--- Document 1 (Relevance: 0.88) ---\n\nplain content\n\n"
        );
    }
}
