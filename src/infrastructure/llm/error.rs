//! Model API error types and context-limit classification.

use thiserror::Error;

use crate::domain::ports::model_client::ModelError;

/// Errors from a single HTTP request to a model provider.
#[derive(Debug, Clone, Error)]
pub enum ApiRequestError {
    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Invalid or missing API key (HTTP 401/403)
    #[error("Invalid API key - authentication failed")]
    InvalidApiKey,

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded - too many requests")]
    RateLimited,

    /// Server error (HTTP 5xx, 529)
    #[error("Server error ({0}): {1}")]
    Server(u16, String),

    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed response body
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiRequestError {
    /// Returns true if this error is transient and should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Server(_, _) | Self::Network(_)
        )
    }

    /// Build an error from an HTTP status and response body.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 | 404 | 422 => Self::BadRequest(body),
            401 | 403 => Self::InvalidApiKey,
            429 => Self::RateLimited,
            status if status >= 500 || status == 529 => Self::Server(status, body),
            _ => Self::BadRequest(body),
        }
    }

    /// Map a final request error into the domain classification for the
    /// given model.
    ///
    /// The context-limit class is detected from the provider's error shape;
    /// every provider family words it differently.
    pub fn into_model_error(self, model_id: &str) -> ModelError {
        match self {
            Self::BadRequest(message) if is_context_limit_message(model_id, &message) => {
                ModelError::ContextLimitExceeded {
                    model: model_id.to_string(),
                    message,
                }
            }
            Self::Network(message) => ModelError::Network(message),
            Self::Malformed(message) => ModelError::MalformedResponse(message),
            other => ModelError::Api(other.to_string()),
        }
    }
}

/// Check whether a provider error message describes a context/length
/// overflow, using the model id's provider prefix to pick the right shape.
///
/// With an unknown prefix, every family's shape is checked.
pub fn is_context_limit_message(model_id: &str, message: &str) -> bool {
    let model = model_id.to_lowercase();
    let message = message.to_lowercase();

    if model.starts_with("anthropic:") {
        return anthropic_context_limit(&message);
    }
    if model.starts_with("openai:") {
        return openai_context_limit(&message);
    }
    if model.starts_with("google:") || model.starts_with("gemini:") {
        return google_context_limit(&message);
    }

    anthropic_context_limit(&message)
        || openai_context_limit(&message)
        || google_context_limit(&message)
}

fn anthropic_context_limit(message: &str) -> bool {
    message.contains("prompt is too long")
}

fn openai_context_limit(message: &str) -> bool {
    if message.contains("context_length_exceeded") {
        return true;
    }
    let token_keywords = ["token", "context", "length", "reduce"];
    message.contains("maximum") && token_keywords.iter().any(|keyword| message.contains(keyword))
}

fn google_context_limit(message: &str) -> bool {
    message.contains("resource exhausted") || message.contains("resourceexhausted")
}
