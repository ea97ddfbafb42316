use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_RAG_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// SDK configuration.
///
/// ```yaml
/// llm:
///   provider: anthropic
///   api_key: sk-ant-...
/// rag:
///   embedding_provider: openai
///   api_key: sk-...
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,

    /// RAG is only initialized when this section is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag: Option<RagConfig>,
}

/// Configuration for the LLM provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name; only `anthropic` is supported.
    pub provider: String,
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: u32,
    /// Overrides the provider's API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl LlmConfig {
    pub fn new(provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Fills unset fields with the SDK defaults.
    pub fn apply_defaults(&mut self) {
        if self.model.is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }
        if self.temperature == 0.0 {
            self.temperature = DEFAULT_TEMPERATURE;
        }
        if self.max_tokens == 0 {
            self.max_tokens = DEFAULT_MAX_TOKENS;
        }
    }
}

/// Configuration for the RAG module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    /// `openai`, `voyageai` (alias `voyage`), or any name registered with a
    /// [`ProviderRegistry`](crate::rag::ProviderRegistry).
    pub embedding_provider: String,
    pub api_key: String,
    /// Embedding model; each provider has its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Expected vector length. Advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_dim: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_rag_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rag_timeout_secs() -> u64 {
    DEFAULT_RAG_TIMEOUT_SECS
}

impl RagConfig {
    pub fn new(embedding_provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            embedding_provider: embedding_provider.into(),
            api_key: api_key.into(),
            model: None,
            embedding_dim: None,
            base_url: None,
            timeout_secs: DEFAULT_RAG_TIMEOUT_SECS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Per-request timeout for embedding calls. Zero selects the default.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            Duration::from_secs(DEFAULT_RAG_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }
}

impl Config {
    pub fn new(llm: LlmConfig) -> Self {
        Self { llm, rag: None }
    }

    pub fn with_rag(mut self, rag: RagConfig) -> Self {
        self.rag = Some(rag);
        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks required fields and applies LLM defaults.
    pub fn validate(&mut self) -> Result<()> {
        if self.llm.provider.is_empty() {
            return Err(ConfigError::Invalid("LLM provider is required".to_string()));
        }
        if self.llm.api_key.is_empty() {
            return Err(ConfigError::Invalid("LLM API key is required".to_string()));
        }

        self.llm.apply_defaults();
        if let Some(rag) = &mut self.rag {
            if rag.timeout_secs == 0 {
                rag.timeout_secs = DEFAULT_RAG_TIMEOUT_SECS;
            }
        }
        Ok(())
    }
}
