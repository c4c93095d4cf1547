//! Per-topic analyzer unit.
//!
//! A bounded ReAct loop: the unit alternates between asking the model
//! which capabilities to invoke (think) and executing the requested calls
//! concurrently (act), until the model requests nothing, signals
//! completion, or the tool-call budget runs out. The unit then hands its
//! private history to the compression stage and returns the result.

use std::sync::Arc;

use futures::future::join_all;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::config::RunConfig;
use crate::domain::models::conversation::{ConversationHistory, MessageEntry, ToolCall};
use crate::domain::models::report::AnalysisReport;
use crate::domain::ports::capability::{CapabilityRegistry, COMPLETION_CAPABILITY};
use crate::domain::ports::model_client::{complete_with_retries, CompletionRequest, ModelClient};

use super::compression::compress_analysis;
use super::prompts;

/// One analyzer unit, dispatchable on any number of topics.
///
/// The unit is stateless between runs; each `run` owns a fresh private
/// history seeded with the analysis instruction and the topic.
pub struct AnalyzerUnit {
    config: Arc<RunConfig>,
    model: Arc<dyn ModelClient>,
    registry: Arc<CapabilityRegistry>,
}

impl AnalyzerUnit {
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

    /// Run the think/act loop on one topic and compress the findings.
    ///
    /// The topic must be self-contained: the unit has no visibility into
    /// the supervisor's history.
    pub async fn run(&self, topic: &str) -> DomainResult<AnalysisReport> {
        if !self.registry.has_analysis_capabilities() {
            return Err(DomainError::NoCapabilities);
        }

        let mut history = ConversationHistory::from_entries(vec![
            MessageEntry::System(prompts::analysis_system_prompt(&prompts::today_str())),
            MessageEntry::Human(topic.to_string()),
        ]);
        let mut tool_call_iterations: u32 = 0;

        loop {
            // Think: ask the model which capabilities to invoke.
            let request = CompletionRequest {
                model_id: self.config.analysis_model.id.clone(),
                max_tokens: self.config.analysis_model.max_output_tokens,
                history: history.clone(),
                tools: self.registry.specs(),
            };
            let turn = complete_with_retries(
                self.model.as_ref(),
                request,
                self.config.max_structured_output_retries,
            )
            .await?;
            tool_call_iterations += 1;

            let requested_calls = turn.tool_calls.clone();
            let completion_requested = requested_calls
                .iter()
                .any(|call| call.name == COMPLETION_CAPABILITY);
            history.push(MessageEntry::Assistant(turn));

            // Act: no requested calls means there is nothing left to do.
            if requested_calls.is_empty() {
                break;
            }

            let executions = requested_calls
                .iter()
                .map(|call| self.execute_call_safely(call));
            let observations = join_all(executions).await;

            // Results land index-aligned with the requesting calls.
            for (call, observation) in requested_calls.iter().zip(observations) {
                history.push(MessageEntry::ToolResult {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    content: observation,
                });
            }

            if tool_call_iterations >= self.config.max_unit_tool_calls || completion_requested {
                break;
            }
        }

        Ok(compress_analysis(
            self.model.as_ref(),
            &self.config.compression_model,
            history,
        )
        .await)
    }

    /// Execute one capability call, degrading any failure to a textual
    /// observation the model can reason about.
    async fn execute_call_safely(&self, call: &ToolCall) -> String {
        let result = match self.registry.resolve(&call.name) {
            Ok(capability) => capability.invoke(call.arguments.clone()).await,
            Err(err) => Err(err),
        };

        result.unwrap_or_else(|err| {
            tracing::warn!("Capability '{}' failed: {err}", call.name);
            format!("Error executing tool: {err}")
        })
    }
}
