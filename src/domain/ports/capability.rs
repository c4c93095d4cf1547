//! Port trait and registry for analysis capabilities.
//!
//! The registry is the tool gateway: a closed set of named capabilities
//! resolved once per run. It always contains the synthetic completion
//! signal, so it is available even when no real capabilities are
//! configured (degenerate set).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ports::model_client::ToolSpec;

/// Name of the synthetic no-op capability an analyzer calls to signal that
/// its analysis is complete.
pub const COMPLETION_CAPABILITY: &str = "AnalysisComplete";

/// Errors from capability invocation.
///
/// These are always caught at the call site and degraded to a textual
/// observation; they never propagate out of an analyzer unit.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    /// The requested name is not in the registry. The registry is a closed
    /// set resolved at run start, so this is a programmer (or model) error
    /// surfaced loudly rather than a lookup miss.
    #[error("Unknown capability: {0}")]
    Unknown(String),

    /// The arguments did not match the capability's schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The capability ran and failed.
    #[error("{0}")]
    Invocation(String),
}

/// Port trait for one invocable analysis capability.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for the capability's arguments.
    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    /// Invoke the capability, producing a text report.
    async fn invoke(&self, args: serde_json::Value) -> Result<String, CapabilityError>;
}

/// The synthetic completion signal. Invoking it does nothing; its presence
/// in a request is what matters.
pub struct CompletionSignal;

#[async_trait]
impl Capability for CompletionSignal {
    fn name(&self) -> &str {
        COMPLETION_CAPABILITY
    }

    fn description(&self) -> &str {
        "Call this tool to indicate that the repository analysis is complete."
    }

    async fn invoke(&self, _args: serde_json::Value) -> Result<String, CapabilityError> {
        Ok("Analysis completed".to_string())
    }
}

/// Closed registry of capabilities for one run.
pub struct CapabilityRegistry {
    entries: Vec<Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    /// A registry holding only the completion signal.
    pub fn empty() -> Self {
        Self {
            entries: vec![Arc::new(CompletionSignal)],
        }
    }

    /// A registry holding the completion signal plus the given analysis
    /// capabilities.
    pub fn with_capabilities(capabilities: Vec<Arc<dyn Capability>>) -> Self {
        let mut registry = Self::empty();
        registry.entries.extend(capabilities);
        registry
    }

    /// Resolve a capability by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Capability>, CapabilityError> {
        self.entries
            .iter()
            .find(|capability| capability.name() == name)
            .cloned()
            .ok_or_else(|| CapabilityError::Unknown(name.to_string()))
    }

    /// Tool specs for every registered capability, completion included.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.entries
            .iter()
            .map(|capability| ToolSpec {
                name: capability.name().to_string(),
                description: capability.description().to_string(),
                parameters: capability.parameters(),
            })
            .collect()
    }

    /// Names of the analysis capabilities, excluding the completion signal.
    pub fn analysis_capability_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|capability| capability.name())
            .filter(|name| *name != COMPLETION_CAPABILITY)
            .collect()
    }

    /// True when at least one real analysis capability is registered.
    pub fn has_analysis_capabilities(&self) -> bool {
        !self.analysis_capability_names().is_empty()
    }
}
