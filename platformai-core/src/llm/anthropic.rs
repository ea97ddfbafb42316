//! Anthropic Messages API client.

use super::types::{
    clean_llm_response, ContentBlock, GenerateRequest, GenerateResponse,
    GenerateWithToolsRequest, LlmClient, LlmError, Message, Result, Tool, ToolUse, Usage,
};
use crate::config::{LlmConfig, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for Anthropic's Claude models.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    endpoint: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> Self {
        let model = if config.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            config.model.clone()
        };
        let client = Self {
            api_key: config.api_key.clone(),
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            endpoint: String::new(),
            timeout: DEFAULT_TIMEOUT,
            http_client: reqwest::Client::new(),
        };
        client.with_base_url(config.base_url.as_deref().unwrap_or(ANTHROPIC_BASE_URL))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.endpoint = format!("{}/v1/messages", base_url.trim_end_matches('/'));
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

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request<'a>(
        &'a self,
        system: &'a str,
        messages: Vec<WireMessage<'a>>,
        temperature: f32,
        max_tokens: u32,
        tools: &'a [Tool],
    ) -> WireRequest<'a> {
        let temperature = if temperature == 0.0 {
            self.temperature
        } else {
            temperature
        };
        let max_tokens = match (max_tokens, self.max_tokens) {
            (0, 0) => DEFAULT_MAX_TOKENS,
            (0, configured) => configured,
            (requested, _) => requested,
        };

        WireRequest {
            model: &self.model,
            max_tokens,
            temperature,
            system,
            messages,
            tools,
        }
    }

    async fn send(&self, request: &WireRequest<'_>) -> Result<GenerateResponse> {
        debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending Anthropic request"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<WireErrorEnvelope>(&body) {
                Ok(envelope) => LlmError::Api {
                    kind: envelope.error.kind,
                    message: envelope.error.message,
                },
                Err(_) => LlmError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let parsed: WireResponse = serde_json::from_str(&body)?;
        let mut text = String::new();
        let mut tool_uses = Vec::new();
        for block in parsed.content {
            match block.kind.as_str() {
                "text" => text.push_str(&block.text),
                "tool_use" => tool_uses.push(ToolUse {
                    id: block.id,
                    name: block.name,
                    input: block.input.unwrap_or_default(),
                }),
                _ => {}
            }
        }

        let usage = Usage {
            prompt_tokens: parsed.usage.input_tokens,
            completion_tokens: parsed.usage.output_tokens,
            total_tokens: parsed.usage.input_tokens + parsed.usage.output_tokens,
        };
        debug!(
            stop_reason = %parsed.stop_reason,
            total_tokens = usage.total_tokens,
            "Anthropic response received"
        );

        Ok(GenerateResponse {
            text,
            usage,
            tool_uses,
            stop_reason: parsed.stop_reason,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let messages = vec![WireMessage {
            role: "user",
            content: WireContent::Text(&request.user_prompt),
        }];
        let wire = self.build_request(
            &request.system_prompt,
            messages,
            request.temperature,
            request.max_tokens,
            &request.tools,
        );

        let mut response = self.send(&wire).await?;
        response.text = clean_llm_response(&response.text);
        Ok(response)
    }

    async fn generate_with_tools(
        &self,
        request: GenerateWithToolsRequest,
    ) -> Result<GenerateResponse> {
        let messages = request.messages.iter().map(WireMessage::from).collect();
        let wire = self.build_request(
            &request.system_prompt,
            messages,
            request.temperature,
            request.max_tokens,
            &request.tools,
        );

        self.send(&wire).await
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "is_zero")]
    temperature: f32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "<[Tool]>::is_empty")]
    tools: &'a [Tool],
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: WireContent<'a>,
}

/// A lone text block is sent as a plain string.
#[derive(Serialize)]
#[serde(untagged)]
enum WireContent<'a> {
    Text(&'a str),
    Blocks(&'a [ContentBlock]),
}

impl<'a> From<&'a Message> for WireMessage<'a> {
    fn from(message: &'a Message) -> Self {
        let content = match message.content.as_slice() {
            [ContentBlock::Text { text }] => WireContent::Text(text),
            blocks => WireContent::Blocks(blocks),
        };
        Self {
            role: &message.role,
            content,
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    content: Vec<WireBlock>,
    #[serde(default)]
    stop_reason: String,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Deserialize)]
struct WireBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    input: Option<Map<String, Value>>,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Deserialize)]
struct WireErrorEnvelope {
    error: WireErrorDetail,
}

#[derive(Deserialize)]
struct WireErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

fn is_zero(value: &f32) -> bool {
    *value == 0.0
}
