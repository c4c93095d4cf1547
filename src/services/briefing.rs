//! Pre-flight stages: the clarification gate and the brief writer.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::config::RunConfig;
use crate::domain::models::conversation::{
    AssistantTurn, ConversationHistory, MessageEntry,
};
use crate::domain::models::decision::{ClarifyDecision, DesignQuery};
use crate::domain::ports::model_client::{structured_decision, CompletionRequest, ModelClient};
use crate::infrastructure::github::context::{configure_repository, RepoRef};

use super::prompts;

/// Outcome of the clarification gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Terminate the run and surface this question to the caller.
    Clarify(String),
    /// Proceed to the brief writer.
    Proceed,
}

/// Decides whether the request is analyzable as-is.
pub struct ClarificationGate {
    config: Arc<RunConfig>,
    model: Arc<dyn ModelClient>,
}

impl ClarificationGate {
    pub fn new(config: Arc<RunConfig>, model: Arc<dyn ModelClient>) -> Self {
        Self { config, model }
    }

    /// Evaluate the conversation so far.
    ///
    /// With clarification disabled this proceeds without any model call.
    /// Otherwise one structured decision is requested; proceeding appends
    /// the verification acknowledgement to the history. Decision-call
    /// exhaustion propagates to the caller.
    pub async fn evaluate(&self, history: &mut ConversationHistory) -> DomainResult<GateOutcome> {
        if !self.config.allow_clarification {
            return Ok(GateOutcome::Proceed);
        }

        let prompt =
            prompts::clarify_instructions(&history.buffer_string(), &prompts::today_str());
        let request = CompletionRequest::text(
            self.config.analysis_model.id.clone(),
            self.config.analysis_model.max_output_tokens,
            ConversationHistory::from_entries(vec![MessageEntry::Human(prompt)]),
        );

        let decision: ClarifyDecision = structured_decision(
            self.model.as_ref(),
            request,
            self.config.max_structured_output_retries,
        )
        .await?;

        if decision.need_clarification {
            history.push(MessageEntry::Assistant(AssistantTurn::text(
                decision.question.clone(),
            )));
            Ok(GateOutcome::Clarify(decision.question))
        } else {
            history.push(MessageEntry::Assistant(AssistantTurn::text(
                decision.verification,
            )));
            Ok(GateOutcome::Proceed)
        }
    }
}

/// The brief writer's output: the structured query plus the resolved
/// repository and its setup acknowledgement.
#[derive(Debug, Clone)]
pub struct DesignBrief {
    pub query: DesignQuery,
    pub repo: RepoRef,
    pub repo_setup: String,
}

/// Restates the conversation as a structured design query and resolves
/// the repository reference.
pub struct BriefWriter {
    config: Arc<RunConfig>,
    model: Arc<dyn ModelClient>,
}

impl BriefWriter {
    pub fn new(config: Arc<RunConfig>, model: Arc<dyn ModelClient>) -> Self {
        Self { config, model }
    }

    /// Map the conversation to a `(repo_url, design_brief)` pair, then
    /// resolve and register the repository reference.
    pub async fn write(&self, history: &ConversationHistory) -> DomainResult<DesignBrief> {
        let prompt =
            prompts::design_query_instructions(&history.buffer_string(), &prompts::today_str());
        let request = CompletionRequest::text(
            self.config.analysis_model.id.clone(),
            self.config.analysis_model.max_output_tokens,
            ConversationHistory::from_entries(vec![MessageEntry::Human(prompt)]),
        );

        let query: DesignQuery = structured_decision(
            self.model.as_ref(),
            request,
            self.config.max_structured_output_retries,
        )
        .await?;

        let (repo, repo_setup) = configure_repository(&query.repo_url)?;
        tracing::info!("Analyzing repository {repo}");

        Ok(DesignBrief {
            query,
            repo,
            repo_setup,
        })
    }
}
