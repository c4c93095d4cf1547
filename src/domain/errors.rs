//! Domain errors for the Blueprint pipeline.

use thiserror::Error;

use crate::domain::ports::model_client::ModelError;

/// Domain-level errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The capability registry holds no analysis capabilities. Raised by an
    /// analyzer unit before its first model call; fatal and never retried.
    #[error(
        "No analysis capabilities available: configure a GitHub access token and repository URL"
    )]
    NoCapabilities,

    /// A repository reference could not be parsed into an owner/repo pair.
    #[error("Invalid repository reference: {0}")]
    InvalidRepoReference(String),

    /// A model invocation failed at a scope's outermost step.
    #[error("Model invocation failed: {0}")]
    Model(#[from] ModelError),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
