//! SDK entry point.

use crate::codemapping::CodeMapping;
use crate::config::Config;
use crate::error::{Result, SdkError};
use crate::llm::{self, LlmClient};
use crate::rag::RagModule;
use std::sync::Arc;
use tracing::info;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Owns the configured LLM client and, when configured, the RAG module.
///
/// # Example
///
/// ```no_run
/// # use platformai_core::config::{Config, LlmConfig};
/// # use platformai_core::Sdk;
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sdk = Sdk::new(Config::new(LlmConfig::new("anthropic", "sk-ant-...")))?;
/// assert!(sdk.rag().is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Sdk {
    config: Config,
    llm: Arc<dyn LlmClient>,
    rag: Option<RagModule>,
}

impl Sdk {
    /// Validates `config`, then builds the LLM client and the optional RAG module.
    pub fn new(mut config: Config) -> Result<Self> {
        config.validate()?;
        let llm = llm::new_client(&config.llm).map_err(SdkError::LlmClient)?;
        Self::build(config, llm)
    }

    /// Like [`new`](Self::new) with a caller-supplied LLM client.
    pub fn with_llm_client(mut config: Config, llm: Arc<dyn LlmClient>) -> Result<Self> {
        config.validate()?;
        Self::build(config, llm)
    }

    fn build(config: Config, llm: Arc<dyn LlmClient>) -> Result<Self> {
        let rag = config
            .rag
            .as_ref()
            .map(RagModule::new)
            .transpose()
            .map_err(SdkError::RagModule)?;

        info!(
            version = VERSION,
            provider = %config.llm.provider,
            model = %config.llm.model,
            rag = rag.is_some(),
            "Platform AI SDK initialized"
        );

        Ok(Self { config, llm, rag })
    }

    /// The validated configuration, defaults applied.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    /// `None` when the configuration has no `rag` section.
    pub fn rag(&self) -> Option<&RagModule> {
        self.rag.as_ref()
    }

    pub fn code_mapping(&self) -> CodeMapping {
        CodeMapping::new(Arc::clone(&self.llm))
    }
}
