//! Model invocation adapter: reqwest-based Anthropic Messages API client
//! with retry, rate-agnostic error classification, and context-limit
//! detection per model family.

pub mod client;
pub mod error;
pub mod retry;
pub mod token_limits;

pub use client::{AnthropicModelClient, ModelClientConfig};
pub use error::ApiRequestError;
pub use retry::RetryPolicy;
pub use token_limits::model_token_limit;
