//! LLM-backed platform configuration generator.

use super::types::{PlatformConfig, RepositoryAnalysis};
use crate::llm::{GenerateRequest, LlmClient, LlmError};
use std::fmt::Write;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const MAX_PROMPT_FILES: usize = 15;
const MAX_PROMPT_DEPENDENCIES: usize = 10;
const GENERATION_TEMPERATURE: f32 = 0.3;
const GENERATION_MAX_TOKENS: u32 = 4096;

const SYSTEM_PROMPT: &str = "You are a Platform Engineering expert who generates optimal platform configurations.

Your task: Analyze repository information and generate a complete platform configuration.

Guidelines:
- Choose appropriate resource allocations based on tech stack
- Set realistic scaling parameters
- Configure monitoring and health checks
- Add necessary dependencies (database, cache, etc.)
- Follow platform best practices

Output: Valid JSON matching the PlatformConfig schema.";

const CONFIG_SCHEMA: &str = r#"{
  "service": {
    "name": "string (infer from repo, use lowercase with hyphens)",
    "template": "string (e.g., 'microservice', 'web-app', 'api')",
    "runtime": "string (e.g., 'go1.21', 'node20', 'python3.11')",
    "framework": "string (detected framework)",
    "port": 8080
  },
  "resources": {
    "cpu": "string (e.g., '500m', '1000m')",
    "memory": "string (e.g., '512Mi', '1Gi')",
    "scaling": {
      "min_replicas": 2,
      "max_replicas": 10,
      "target_cpu_percent": 70
    }
  },
  "database": {
    "type": "string (e.g., 'postgresql', 'mysql', 'mongodb' or null if not needed)",
    "version": "string",
    "storage": "string (e.g., '10Gi')"
  },
  "cache": {
    "type": "string (e.g., 'redis', 'memcached' or null if not needed)",
    "version": "string",
    "memory": "string (e.g., '256Mi')"
  },
  "monitoring": {
    "metrics": true,
    "logs": true,
    "traces": true
  },
  "security": {
    "health_check": {
      "path": "/health",
      "port": 8080
    }
  }
}"#;

const RULES: &str = "Rules:
1. If no database/cache dependencies detected, set those fields to null
2. Use appropriate resource sizes based on language (Go: smaller, Node/Python: larger)
3. Set port based on framework defaults
4. Ensure JSON is valid and properly formatted

Respond with ONLY valid JSON, no markdown or explanation.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("failed to parse LLM response as JSON: {source} (response: {response})")]
    Parse {
        #[source]
        source: serde_json::Error,
        response: String,
    },
}

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Asks the LLM for a [`PlatformConfig`] describing how to deploy a repository.
#[derive(Clone)]
pub struct ConfigGenerator {
    llm: Arc<dyn LlmClient>,
}

impl ConfigGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, analysis: &RepositoryAnalysis) -> Result<PlatformConfig> {
        let request = GenerateRequest::new(SYSTEM_PROMPT, build_user_prompt(analysis))
            .with_temperature(GENERATION_TEMPERATURE)
            .with_max_tokens(GENERATION_MAX_TOKENS);

        let response = self.llm.generate(request).await?;
        debug!(
            tokens = response.usage.total_tokens,
            "Platform config generated"
        );

        serde_json::from_str(&response.text).map_err(|source| GenerationError::Parse {
            source,
            response: response.text,
        })
    }
}

/// Summarizes the analysis for the model: the first files and dependencies only.
pub fn build_user_prompt(analysis: &RepositoryAnalysis) -> String {
    let dependencies = analysis
        .dependencies
        .iter()
        .take(MAX_PROMPT_DEPENDENCIES)
        .map(|(name, version)| format!("  - {}: {}", name, version))
        .collect::<Vec<_>>()
        .join("\n");
    let files = analysis
        .files
        .iter()
        .take(MAX_PROMPT_FILES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = String::from("Analyze this repository and generate platform configuration:\n\n");
    let _ = writeln!(prompt, "Repository Analysis:");
    let _ = writeln!(prompt, "- Primary Language: {}", analysis.primary_language);
    let _ = writeln!(prompt, "- Framework: {}", analysis.detected_framework);
    let _ = writeln!(prompt, "- Language Version: {}", analysis.language_version);
    let _ = writeln!(prompt, "- Has Dockerfile: {}", analysis.has_dockerfile);
    let _ = writeln!(prompt, "- Total Files: {}", analysis.files.len());
    let _ = writeln!(prompt, "- Total Dependencies: {}", analysis.dependencies.len());
    let _ = write!(prompt, "\nKey Dependencies:\n{}\n\nSample Files:\n{}\n\n", dependencies, files);
    let _ = write!(
        prompt,
        "Generate a complete platform configuration as JSON with these fields:\n{}\n\n{}",
        CONFIG_SCHEMA, RULES
    );
    prompt
}
