//! Embedding generation through hosted embedding APIs.
//!
//! This module converts text into vector embeddings. Callers depend on the
//! [`EmbeddingProvider`] trait; [`HttpEmbeddingProvider`] implements it for the
//! OpenAI and Voyage AI embedding endpoints, which share one wire format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Longest slice of an error body kept in [`EmbeddingError::Api`].
const ERROR_BODY_LIMIT: usize = 512;

/// Default per-request timeout for embedding calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur during embedding generation.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Transport failure, including timeouts.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("{provider} API request failed with status {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// A batch response did not line up with the request.
    #[error("expected {expected} embeddings, provider returned {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// The API response contained no embeddings.
    #[error("no embeddings returned")]
    NoEmbeddings,
}

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Converts text into fixed-dimension vectors.
///
/// Each call issues exactly one outbound request and never retries. Dropping
/// the returned future aborts an in-flight request, so callers apply their own
/// deadlines with `tokio::time::timeout` or `select!`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name, as used in configuration.
    fn name(&self) -> &str;

    /// Generates an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generates embeddings for several texts in one request.
    ///
    /// The vector at index `i` belongs to `texts[i]`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// The hosted embedding APIs this crate speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    OpenAi,
    Voyage,
}

impl EmbeddingBackend {
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Voyage => "voyageai",
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Voyage => "https://api.voyageai.com",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "text-embedding-3-small",
            Self::Voyage => "voyage-3",
        }
    }
}

/// Embedding client for OpenAI-compatible `/v1/embeddings` endpoints.
///
/// # Example
///
/// ```no_run
/// # use platformai_core::rag::{EmbeddingProvider, HttpEmbeddingProvider};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let embedder = HttpEmbeddingProvider::openai("sk-...", None);
/// let embedding = embedder.embed("Always set resource limits").await?;
/// println!("dimension: {}", embedding.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    backend: EmbeddingBackend,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl HttpEmbeddingProvider {
    /// Creates a client for `backend`. An empty or missing model selects the backend default.
    pub fn new(backend: EmbeddingBackend, api_key: impl Into<String>, model: Option<&str>) -> Self {
        let model = model
            .filter(|m| !m.is_empty())
            .unwrap_or(backend.default_model())
            .to_string();

        Self {
            backend,
            api_key: api_key.into(),
            model,
            endpoint: endpoint_for(backend.base_url()),
            timeout: DEFAULT_TIMEOUT,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn openai(api_key: impl Into<String>, model: Option<&str>) -> Self {
        Self::new(EmbeddingBackend::OpenAi, api_key, model)
    }

    pub fn voyage(api_key: impl Into<String>, model: Option<&str>) -> Self {
        Self::new(EmbeddingBackend::Voyage, api_key, model)
    }

    /// Points the client at a different host, e.g. a proxy or a local stub.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.endpoint = endpoint_for(base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn backend(&self) -> EmbeddingBackend {
        self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            input: texts,
            model: &self.model,
        };

        debug!(
            provider = self.backend.name(),
            model = %self.model,
            inputs = texts.len(),
            "Requesting embeddings"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(EmbeddingError::Api {
                provider: self.backend.name(),
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let parsed: EmbedResponse = serde_json::from_str(&body)?;
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.request(&[text.to_string()]).await?;
        match embeddings.len() {
            0 => Err(EmbeddingError::NoEmbeddings),
            1 => Ok(embeddings.swap_remove(0)),
            actual => Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual,
            }),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.request(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }
        Ok(embeddings)
    }
}

fn endpoint_for(base_url: &str) -> String {
    format!("{}/v1/embeddings", base_url.trim_end_matches('/'))
}

fn snippet(body: &str) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut end = ERROR_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}
