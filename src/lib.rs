//! platformai - Platform AI SDK
//!
//! Convenience wrapper crate that re-exports the SDK components.
//!
//! # Quick Start
//!
//! ```no_run
//! use platformai::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new(LlmConfig::new("anthropic", "sk-ant-..."))
//!     .with_rag(RagConfig::new("voyageai", "pa-..."));
//! let sdk = Sdk::new(config)?;
//!
//! if let Some(rag) = sdk.rag() {
//!     rag.add_document("runbook", "Restart the pod with kubectl rollout restart.", Default::default())
//!         .await?;
//!     let context = rag.query("How do I restart a deployment?", 3).await?;
//!
//!     let answer = sdk
//!         .llm()
//!         .generate_with_context(GenerateRequest::new("You are an SRE.", "Restart it."), &context)
//!         .await?;
//!     println!("{}", answer.text);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export core
pub use platformai_core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use platformai_core::codemapping::{AnalyzeRequest, AnalyzeResult, CodeMapping};
    pub use platformai_core::config::{Config, LlmConfig, RagConfig};
    pub use platformai_core::llm::{GenerateRequest, GenerateResponse, LlmClient};
    pub use platformai_core::rag::{
        DocumentInput, EmbeddingProvider, RagModule, RetrieveRequest, RetrieveResponse,
        VectorStore,
    };
    pub use platformai_core::{Sdk, SdkError};
}
