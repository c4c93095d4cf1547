//! Port trait for language model invocation.
//!
//! The pipeline treats model calls as opaque: a conversation history plus
//! invocation options go in, an assistant turn (text and/or tool calls)
//! comes out. Failures carry a classification; the context-limit class
//! drives the shrink-and-retry ladders in compression and synthesis.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::conversation::{AssistantTurn, ConversationHistory};

/// Declaration of one invocable capability, handed to the model so it can
/// request calls by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema for the capability's arguments
    pub parameters: serde_json::Value,
}

/// A single completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Provider-prefixed model identifier
    pub model_id: String,
    /// Maximum output tokens to generate
    pub max_tokens: u32,
    /// Conversation history to complete
    pub history: ConversationHistory,
    /// Capabilities the model may request calls to (empty for plain text)
    pub tools: Vec<ToolSpec>,
}

impl CompletionRequest {
    /// A plain text request with no tools bound.
    pub fn text(model_id: impl Into<String>, max_tokens: u32, history: ConversationHistory) -> Self {
        Self {
            model_id: model_id.into(),
            max_tokens,
            history,
            tools: Vec::new(),
        }
    }
}

/// Errors from model invocation, classified for recovery decisions.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The request exceeded the model's context window. Classified per
    /// provider family; triggers shrink-and-retry ladders.
    #[error("Context limit exceeded for {model}: {message}")]
    ContextLimitExceeded { model: String, message: String },

    /// The provider rejected or failed the request.
    #[error("Model API error: {0}")]
    Api(String),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be interpreted.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// A structured decision call exhausted its retry budget.
    #[error("Structured decision failed after {attempts} attempts: {last_error}")]
    StructuredExhausted { attempts: u32, last_error: String },
}

impl ModelError {
    /// True when this error is the context/length-exceeded class.
    pub fn is_context_limit(&self) -> bool {
        matches!(self, Self::ContextLimitExceeded { .. })
    }
}

/// Port trait for the model invocation collaborator.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Complete a conversation, returning the assistant's turn.
    async fn complete(&self, request: CompletionRequest) -> Result<AssistantTurn, ModelError>;
}

/// Complete with a bounded retry budget.
///
/// Planning-stage calls (clarification, brief extraction, supervisor plan,
/// analyzer think) retry any failure up to `max_attempts` total attempts;
/// exhaustion propagates the last error to the caller.
pub async fn complete_with_retries(
    client: &dyn ModelClient,
    request: CompletionRequest,
    max_attempts: u32,
) -> Result<AssistantTurn, ModelError> {
    let attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match client.complete(request.clone()).await {
            Ok(turn) => return Ok(turn),
            Err(err) => {
                tracing::warn!("Model call attempt {attempt}/{attempts} failed: {err}");
                last_error = Some(err);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ModelError::Api("no attempts were made".to_string())))
}

/// Request a structured decision and parse it from the model's JSON reply.
///
/// Parse failures consume attempts from the same budget as call failures;
/// exhaustion returns `StructuredExhausted`.
pub async fn structured_decision<T: DeserializeOwned>(
    client: &dyn ModelClient,
    request: CompletionRequest,
    max_attempts: u32,
) -> Result<T, ModelError> {
    let attempts = max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match client.complete(request.clone()).await {
            Ok(turn) => match serde_json::from_str::<T>(strip_code_fences(&turn.content)) {
                Ok(decision) => return Ok(decision),
                Err(err) => {
                    tracing::warn!(
                        "Structured decision parse attempt {attempt}/{attempts} failed: {err}"
                    );
                    last_error = err.to_string();
                }
            },
            Err(err) => {
                tracing::warn!("Structured decision call attempt {attempt}/{attempts} failed: {err}");
                last_error = err.to_string();
            }
        }
    }

    Err(ModelError::StructuredExhausted {
        attempts,
        last_error,
    })
}

/// Strip a surrounding markdown code fence from a model reply, if present.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
