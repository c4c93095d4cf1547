//! Port traits for external collaborators.

pub mod capability;
pub mod model_client;

pub use capability::{
    Capability, CapabilityError, CapabilityRegistry, CompletionSignal, COMPLETION_CAPABILITY,
};
pub use model_client::{
    complete_with_retries, structured_decision, CompletionRequest, ModelClient, ModelError,
    ToolSpec,
};
