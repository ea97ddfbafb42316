use crate::codemapping::CodeMappingError;
use crate::config::ConfigError;
use crate::llm::LlmError;
use crate::rag::RagError;
use thiserror::Error;

/// Top-level error for SDK construction and any module call made through it.
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create LLM client: {0}")]
    LlmClient(#[source] LlmError),

    #[error("failed to create RAG module: {0}")]
    RagModule(#[source] RagError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    CodeMapping(#[from] CodeMappingError),
}

pub type Result<T> = std::result::Result<T, SdkError>;
