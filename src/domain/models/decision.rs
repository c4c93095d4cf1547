//! Structured decisions returned by planning-stage model calls.

use serde::{Deserialize, Serialize};

use crate::domain::models::conversation::AssistantTurn;
use crate::domain::ports::capability::COMPLETION_CAPABILITY;

/// Name of the planning action that dispatches an analyzer unit.
pub const ANALYZE_ACTION: &str = "AnalyzeRepository";

/// Outcome of the clarification gate's decision call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarifyDecision {
    /// Whether the user must be asked a clarifying question
    pub need_clarification: bool,
    /// Question to surface when clarification is needed
    #[serde(default)]
    pub question: String,
    /// Acknowledgement appended to history when proceeding
    #[serde(default)]
    pub verification: String,
}

/// Structured restatement of the user's request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignQuery {
    /// The repository URL to analyze
    pub repo_url: String,
    /// Expanded objective describing the design document to produce
    pub design_brief: String,
}

/// One action requested by the supervisor's planning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedAction {
    /// Dispatch an analyzer unit on a self-contained topic.
    Analyze { call_id: String, topic: String },
    /// The supervisor considers the analysis complete.
    Complete { call_id: String },
}

impl RequestedAction {
    /// Parse the planning actions out of an assistant turn.
    ///
    /// Only the two planning action names are meaningful; anything else the
    /// model invents is ignored with a warning rather than dispatched.
    pub fn from_turn(turn: &AssistantTurn) -> Vec<Self> {
        turn.tool_calls
            .iter()
            .filter_map(|call| match call.name.as_str() {
                ANALYZE_ACTION => {
                    let topic = call
                        .arguments
                        .get("analysis_topic")
                        .and_then(|value| value.as_str())
                        .unwrap_or_default()
                        .to_string();
                    Some(Self::Analyze {
                        call_id: call.id.clone(),
                        topic,
                    })
                }
                name if name == COMPLETION_CAPABILITY => Some(Self::Complete {
                    call_id: call.id.clone(),
                }),
                other => {
                    tracing::warn!("Ignoring unknown planning action: {other}");
                    None
                }
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}
