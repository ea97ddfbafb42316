//! Common types for LLM clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur when talking to an LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    /// Structured error envelope returned by the provider.
    #[error("API error: {kind} - {message}")]
    Api { kind: String, message: String },

    /// Non-success status whose body could not be decoded.
    #[error("API error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("unsupported LLM provider: {0}")]
    UnsupportedProvider(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

/// Client trait for LLM backends.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single-turn generation. Surrounding markdown code fences are stripped from the text.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Like [`generate`](Self::generate), with `context` and a blank line prepended to the
    /// user prompt when `context` is non-empty.
    async fn generate_with_context(
        &self,
        request: GenerateRequest,
        context: &str,
    ) -> Result<GenerateResponse> {
        let mut request = request;
        if !context.is_empty() {
            request.user_prompt = format!("{}\n\n{}", context, request.user_prompt);
        }
        self.generate(request).await
    }

    /// Multi-turn conversation with tool use. The text is returned as-is.
    async fn generate_with_tools(
        &self,
        request: GenerateWithToolsRequest,
    ) -> Result<GenerateResponse>;
}

/// Single-turn generation request.
///
/// Zero `temperature` or `max_tokens` fall back to the client's configured values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub tools: Vec<Tool>,
}

impl GenerateRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }
}

/// Multi-turn request with tool definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateWithToolsRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
    pub usage: Usage,
    /// Tool invocations requested by the model, in response order.
    pub tool_uses: Vec<ToolUse>,
    /// Why generation stopped (`end_turn`, `tool_use`, `max_tokens`, ...).
    pub stop_reason: String,
}

/// Token accounting for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A function the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool input.
    pub input_schema: Value,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    pub input: Map<String, Value>,
}

/// The outcome of executing a tool, sent back to the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// `user` or `assistant`.
    pub role: String,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
        }
    }

    /// A user turn carrying tool results.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: "user".to_string(),
            content: results.into_iter().map(ContentBlock::from).collect(),
        }
    }
}

/// Message content. `tool_use` blocks always serialize their `input` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Map<String, Value>,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "is_false")]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

impl From<ToolUse> for ContentBlock {
    fn from(tool_use: ToolUse) -> Self {
        Self::ToolUse {
            id: tool_use.id,
            name: tool_use.name,
            input: tool_use.input,
        }
    }
}

impl From<ToolResult> for ContentBlock {
    fn from(result: ToolResult) -> Self {
        Self::ToolResult {
            tool_use_id: result.tool_use_id,
            content: result.content,
            is_error: result.is_error,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Strips a surrounding markdown code fence (```` ```json ... ``` ````) and whitespace.
pub fn clean_llm_response(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }

    let mut lines: Vec<&str> = text.lines().collect();
    if lines.len() <= 2 {
        return text.to_string();
    }

    lines.remove(0);
    if lines.last().is_some_and(|line| line.starts_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}
