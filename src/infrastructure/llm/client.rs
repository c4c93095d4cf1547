//! Anthropic Messages API adapter for the `ModelClient` port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::models::conversation::{
    AssistantTurn, ConversationHistory, MessageEntry, ToolCall,
};
use crate::domain::ports::model_client::{CompletionRequest, ModelClient, ModelError};

use super::error::ApiRequestError;
use super::retry::RetryPolicy;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for the model API client.
#[derive(Debug, Clone)]
pub struct ModelClientConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL for the Messages API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retry policy for transient errors
    pub retry: RetryPolicy,
}

impl ModelClientConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
            timeout_secs: 300,
            retry: RetryPolicy::default(),
        }
    }
}

/// HTTP client for the Anthropic Messages API.
///
/// Translates the pipeline's typed conversation history into wire messages
/// and assistant content blocks back into an [`AssistantTurn`]. Transient
/// failures are retried; the final error is classified into the domain
/// taxonomy (notably the context-limit class).
pub struct AnthropicModelClient {
    http_client: reqwest::Client,
    config: ModelClientConfig,
}

impl AnthropicModelClient {
    pub fn new(config: ModelClientConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    async fn send_once(&self, payload: &WireRequest) -> Result<WireResponse, ApiRequestError> {
        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|err| ApiRequestError::Network(err.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| ApiRequestError::Network(err.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(ApiRequestError::from_status(status, body));
        }

        serde_json::from_str(&body).map_err(|err| ApiRequestError::Malformed(err.to_string()))
    }
}

#[async_trait]
impl ModelClient for AnthropicModelClient {
    async fn complete(&self, request: CompletionRequest) -> Result<AssistantTurn, ModelError> {
        let payload = WireRequest::from_completion(&request);

        let response = self
            .config
            .retry
            .execute(|| self.send_once(&payload))
            .await
            .map_err(|err| err.into_model_error(&request.model_id))?;

        Ok(response.into_turn())
    }
}

/// Strip the provider prefix from a model id for the wire.
fn wire_model_id(model_id: &str) -> &str {
    model_id
        .split_once(':')
        .map_or(model_id, |(_, name)| name)
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<WireBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct WireTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<WireBlock>,
}

impl WireRequest {
    fn from_completion(request: &CompletionRequest) -> Self {
        let (system, messages) = wire_messages(&request.history);
        Self {
            model: wire_model_id(&request.model_id).to_string(),
            max_tokens: request.max_tokens,
            system,
            messages,
            tools: request
                .tools
                .iter()
                .map(|spec| WireTool {
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    input_schema: spec.parameters.clone(),
                })
                .collect(),
        }
    }
}

/// Convert a typed history into the system prompt plus wire messages.
///
/// Consecutive tool results collapse into one user message, as the API
/// requires them directly after the assistant turn that requested them.
fn wire_messages(history: &ConversationHistory) -> (Option<String>, Vec<WireMessage>) {
    let mut system_parts = Vec::new();
    let mut messages: Vec<WireMessage> = Vec::new();

    for entry in history.entries() {
        match entry {
            MessageEntry::System(text) => system_parts.push(text.clone()),
            MessageEntry::Human(text) => messages.push(WireMessage {
                role: "user",
                content: vec![WireBlock::Text { text: text.clone() }],
            }),
            MessageEntry::Assistant(turn) => {
                let mut content = Vec::new();
                if !turn.content.is_empty() {
                    content.push(WireBlock::Text {
                        text: turn.content.clone(),
                    });
                }
                for call in &turn.tool_calls {
                    content.push(WireBlock::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.arguments.clone(),
                    });
                }
                if content.is_empty() {
                    content.push(WireBlock::Text {
                        text: String::new(),
                    });
                }
                messages.push(WireMessage {
                    role: "assistant",
                    content,
                });
            }
            MessageEntry::ToolResult {
                call_id, content, ..
            } => {
                let block = WireBlock::ToolResult {
                    tool_use_id: call_id.clone(),
                    content: content.clone(),
                };
                match messages.last_mut() {
                    Some(message)
                        if message.role == "user"
                            && matches!(
                                message.content.first(),
                                Some(WireBlock::ToolResult { .. })
                            ) =>
                    {
                        message.content.push(block);
                    }
                    _ => messages.push(WireMessage {
                        role: "user",
                        content: vec![block],
                    }),
                }
            }
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, messages)
}

impl WireResponse {
    fn into_turn(self) -> AssistantTurn {
        let mut text_parts = Vec::new();
        let mut tool_calls = Vec::new();

        for block in self.content {
            match block {
                WireBlock::Text { text } => text_parts.push(text),
                WireBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                    id,
                    name,
                    arguments: input,
                }),
                WireBlock::ToolResult { .. } => {}
            }
        }

        AssistantTurn {
            content: text_parts.join("\n"),
            tool_calls,
        }
    }
}
