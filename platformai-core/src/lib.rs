//! platformai-core - Core engine of the Platform AI SDK
//!
//! Provides the building blocks for AI-assisted platform tooling:
//! - RAG (Retrieval Augmented Generation): embedding providers, an in-memory
//!   vector store, and a retriever that formats context for prompts
//! - LLM client abstraction (Anthropic)
//! - Code mapping: repository analysis and platform config generation
//! - Configuration management
//!
//! ## Primary API
//!
//! Most users construct an [`Sdk`] from a [`Config`] and reach the modules
//! through its accessors. [`RagModule`] can also be used on its own.

pub mod codemapping;
pub mod config;
pub mod error;
pub mod llm;
pub mod rag;
pub mod sdk;

#[cfg(test)]
mod test_support;

// Public exports
pub use codemapping::{AnalyzeRequest, AnalyzeResult, CodeMapping, PlatformConfig};
pub use config::{Config, LlmConfig, RagConfig};
pub use error::{Result, SdkError};
pub use llm::{LlmClient, LlmError};
pub use rag::{RagError, RagModule};
pub use sdk::{Sdk, VERSION};
