//! The supervisor loop: the top-level analysis scheduler.
//!
//! A two-state machine over an owned state value. Plan asks the model for
//! the next batch of analysis actions; dispatch either terminates the loop
//! or fans the admitted actions out to concurrent analyzer units. Requests
//! past the concurrency ceiling are rejected with a synthetic result, never
//! queued. Dispatch failures terminate the loop with whatever notes exist;
//! partial results always beat losing the run.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::json;

use crate::domain::models::config::RunConfig;
use crate::domain::models::conversation::{ConversationHistory, MessageEntry};
use crate::domain::models::decision::{RequestedAction, ANALYZE_ACTION};
use crate::domain::models::report::SupervisorOutcome;
use crate::domain::ports::capability::{CapabilityRegistry, COMPLETION_CAPABILITY};
use crate::domain::ports::model_client::{
    complete_with_retries, CompletionRequest, ModelClient, ToolSpec,
};

use super::analyzer::AnalyzerUnit;
use super::prompts;

/// The supervisor's loop state: its private history plus the plan counter.
///
/// Step functions consume and return the state; nothing is shared between
/// steps by reference.
#[derive(Debug, Clone)]
pub struct SupervisorState {
    history: ConversationHistory,
    iterations: u32,
    raw_transcripts: Vec<String>,
}

impl SupervisorState {
    pub fn new(history: ConversationHistory) -> Self {
        Self {
            history,
            iterations: 0,
            raw_transcripts: Vec::new(),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

/// Result of one step: continue looping or terminate with this state.
enum StepOutcome {
    Continue(SupervisorState),
    Terminate(SupervisorState),
}

/// The top-level analysis scheduler.
pub struct Supervisor {
    config: Arc<RunConfig>,
    model: Arc<dyn ModelClient>,
    registry: Arc<CapabilityRegistry>,
}

impl Supervisor {
    pub fn new(
        config: Arc<RunConfig>,
        model: Arc<dyn ModelClient>,
        registry: Arc<CapabilityRegistry>,
    ) -> Self {
        Self {
            config,
            model,
            registry,
        }
    }

    /// Build the seeded history for one run: the lead instruction plus the
    /// repository/brief/setup context as the only human turn.
    pub fn seed_history(&self, repo_url: &str, design_brief: &str, repo_setup: &str) -> ConversationHistory {
        ConversationHistory::from_entries(vec![
            MessageEntry::System(prompts::lead_supervisor_prompt(
                &prompts::today_str(),
                self.config.max_concurrent_analysis_units,
            )),
            MessageEntry::Human(format!(
                "Repository: {repo_url}\n\nDesign Brief: {design_brief}\n\nRepo Setup: {repo_setup}"
            )),
        ])
    }

    /// Loop between plan and dispatch until a terminal condition, then
    /// collect the accumulated notes.
    pub async fn run(&self, seed: ConversationHistory) -> SupervisorOutcome {
        let mut state = SupervisorState::new(seed);

        loop {
            state = match self.plan(state).await {
                StepOutcome::Continue(next) => next,
                StepOutcome::Terminate(terminal) => return Self::collect(terminal),
            };
            state = match self.dispatch(state).await {
                StepOutcome::Continue(next) => next,
                StepOutcome::Terminate(terminal) => return Self::collect(terminal),
            };
        }
    }

    /// Plan: one model call with the two planning actions bound.
    async fn plan(&self, mut state: SupervisorState) -> StepOutcome {
        let request = CompletionRequest {
            model_id: self.config.analysis_model.id.clone(),
            max_tokens: self.config.analysis_model.max_output_tokens,
            history: state.history.clone(),
            tools: planning_tool_specs(),
        };

        match complete_with_retries(
            self.model.as_ref(),
            request,
            self.config.max_structured_output_retries,
        )
        .await
        {
            Ok(turn) => {
                state.history.push(MessageEntry::Assistant(turn));
                state.iterations += 1;
                StepOutcome::Continue(state)
            }
            Err(err) => {
                tracing::error!("Supervisor planning failed: {err}");
                StepOutcome::Terminate(state)
            }
        }
    }

    /// Dispatch: terminate, or fan the admitted actions out concurrently.
    async fn dispatch(&self, mut state: SupervisorState) -> StepOutcome {
        let actions = state
            .history
            .last_assistant()
            .map(RequestedAction::from_turn)
            .unwrap_or_default();

        let exceeded_iterations = state.iterations >= self.config.max_supervisor_iterations;
        let analysis_complete = actions.iter().any(RequestedAction::is_complete);
        if exceeded_iterations || actions.is_empty() || analysis_complete {
            return StepOutcome::Terminate(state);
        }

        let analyze_calls: Vec<(String, String)> = actions
            .into_iter()
            .filter_map(|action| match action {
                RequestedAction::Analyze { call_id, topic } => Some((call_id, topic)),
                RequestedAction::Complete { .. } => None,
            })
            .collect();

        let ceiling = self.config.max_concurrent_analysis_units;
        let admitted = &analyze_calls[..analyze_calls.len().min(ceiling)];
        let overflow = &analyze_calls[analyze_calls.len().min(ceiling)..];

        let unit = AnalyzerUnit::new(
            Arc::clone(&self.config),
            Arc::clone(&self.model),
            Arc::clone(&self.registry),
        );
        let dispatches = admitted.iter().map(|(_, topic)| unit.run(topic));

        match try_join_all(dispatches).await {
            Ok(reports) => {
                for ((call_id, _), report) in admitted.iter().zip(&reports) {
                    state.history.push(MessageEntry::ToolResult {
                        call_id: call_id.clone(),
                        name: ANALYZE_ACTION.to_string(),
                        content: report.compressed.clone(),
                    });
                }
                for (call_id, _) in overflow {
                    state.history.push(MessageEntry::ToolResult {
                        call_id: call_id.clone(),
                        name: ANALYZE_ACTION.to_string(),
                        content: overflow_rejection(ceiling),
                    });
                }
                state.raw_transcripts.push(
                    reports
                        .iter()
                        .map(|report| report.raw.clone())
                        .collect::<Vec<_>>()
                        .join("\n"),
                );
                StepOutcome::Continue(state)
            }
            Err(err) => {
                // Fail open: the distinction is diagnostic only, recovery
                // is the same either way.
                if matches!(&err, crate::domain::errors::DomainError::Model(inner) if inner.is_context_limit())
                {
                    tracing::error!("Token limit exceeded while analyzing: {err}");
                } else {
                    tracing::error!("Error in analysis phase: {err}");
                }
                StepOutcome::Terminate(state)
            }
        }
    }

    /// Collect every tool-result entry into the terminal outcome.
    fn collect(state: SupervisorState) -> SupervisorOutcome {
        SupervisorOutcome {
            notes: state.history.tool_result_contents(),
            raw_transcripts: state.raw_transcripts,
        }
    }
}

/// Rejection text appended for every action past the concurrency ceiling.
pub fn overflow_rejection(ceiling: usize) -> String {
    format!(
        "Error: Did not run this analysis as you have already exceeded the maximum number of \
         concurrent analysis units. Please try again with {ceiling} or fewer analysis units."
    )
}

/// The two actions bound to the supervisor's planning call.
fn planning_tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: ANALYZE_ACTION.to_string(),
            description: "Call this tool to analyze a specific aspect of the repository."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "analysis_topic": {
                        "type": "string",
                        "description": "The specific aspect of the repository to analyze. Should \
                                        be a single topic, described in high detail (at least a \
                                        paragraph)."
                    }
                },
                "required": ["analysis_topic"]
            }),
        },
        ToolSpec {
            name: COMPLETION_CAPABILITY.to_string(),
            description: "Call this tool to indicate that the repository analysis is complete."
                .to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_rejection_names_ceiling() {
        let text = overflow_rejection(3);
        assert!(text.contains("3 or fewer analysis units"));
    }

    #[test]
    fn test_planning_tool_specs() {
        let specs = planning_tool_specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, ANALYZE_ACTION);
        assert_eq!(specs[1].name, COMPLETION_CAPABILITY);
    }
}
