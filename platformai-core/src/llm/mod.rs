//! LLM client abstraction layer.
//!
//! [`LlmClient`] is the seam the rest of the SDK talks to. Anthropic is the only
//! built-in backend; [`new_client`] selects it from [`LlmConfig`].

mod types;
pub mod anthropic;

pub use types::{
    clean_llm_response, ContentBlock, GenerateRequest, GenerateResponse,
    GenerateWithToolsRequest, LlmClient, LlmError, Message, Result, Tool, ToolResult, ToolUse,
    Usage,
};

pub use anthropic::AnthropicClient;

use crate::config::LlmConfig;
use std::sync::Arc;

/// Creates the client for `config.provider`.
pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicClient::new(config))),
        other => Err(LlmError::UnsupportedProvider(other.to_string())),
    }
}
