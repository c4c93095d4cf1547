//! Blueprint - Design Document Pipeline
//!
//! Blueprint turns a natural-language design request plus a GitHub
//! repository URL into a design document. A supervisor agent fans analysis
//! topics out to bounded-concurrency analyzer units; each unit runs a
//! ReAct loop over repository analysis capabilities, compresses its
//! findings, and hands them back for a final synthesis pass.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): histories, reports, decisions, and the
//!   model/capability port traits
//! - **Service Layer** (`services`): the pipeline stages (clarification
//!   gate, brief writer, supervisor, analyzer units, compression, final
//!   synthesis)
//! - **Infrastructure Layer** (`infrastructure`): configuration loading,
//!   the model API client, and the GitHub capability set
//! - **CLI Layer** (`cli`): command-line entry point
//!
//! # Example
//!
//! ```ignore
//! use blueprint::services::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Build a pipeline and run it on a request
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AnalysisReport, AssistantTurn, ClarifyDecision, ConversationHistory, DesignQuery,
    GithubConfig, LoggingConfig, MessageEntry, ModelConfig, RequestedAction, RunConfig,
    SupervisorOutcome, ToolCall,
};
pub use domain::ports::{
    Capability, CapabilityError, CapabilityRegistry, CompletionRequest, ModelClient, ModelError,
    ToolSpec,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Pipeline, PipelineOutcome, Supervisor};
