//! Final synthesis: merge all supervisor findings into one document.
//!
//! Context overflows shrink the findings and retry: the first overflow
//! derives a character budget from the model's known context size, each
//! later one shrinks the budget by 10%. Any other failure aborts with the
//! raw error in the document body. The stage always returns a document.

use crate::domain::models::config::RunConfig;
use crate::domain::models::conversation::{ConversationHistory, MessageEntry};
use crate::domain::models::report::SupervisorOutcome;
use crate::domain::ports::model_client::{CompletionRequest, ModelClient};
use crate::infrastructure::llm::token_limits::model_token_limit;

use super::prompts;

/// Extra attempts beyond the first.
const MAX_RETRIES: u32 = 3;

/// Character budget per token of model context.
const CHARS_PER_TOKEN: usize = 4;

/// Generate the final design document from the supervisor's outcome.
///
/// Consumes the accumulated notes; the supervisor scope is torn down when
/// synthesis begins.
pub async fn generate_design_document(
    model: &dyn ModelClient,
    config: &RunConfig,
    repo_url: &str,
    design_brief: &str,
    outcome: SupervisorOutcome,
) -> String {
    let mut findings = outcome.notes.join("\n");
    let mut budget: Option<usize> = None;
    let mut current_retry = 0;

    while current_retry <= MAX_RETRIES {
        let prompt = prompts::final_document_prompt(
            repo_url,
            design_brief,
            &findings,
            &prompts::today_str(),
        );
        let request = CompletionRequest::text(
            config.synthesis_model.id.clone(),
            config.synthesis_model.max_output_tokens,
            ConversationHistory::from_entries(vec![MessageEntry::Human(prompt)]),
        );

        match model.complete(request).await {
            Ok(turn) => return turn.content,
            Err(err) if err.is_context_limit() => {
                let next_budget = match budget {
                    // First overflow: derive the budget from the model's
                    // known context size. Unknown means no safe estimate.
                    None => match model_token_limit(&config.synthesis_model.id) {
                        Some(token_limit) => token_limit * CHARS_PER_TOKEN,
                        None => {
                            return format!(
                                "Error generating final design document: Token limit exceeded, \
                                 however, the maximum context length of model {} is not known. \
                                 Update the model token limit table with this information. {err}",
                                config.synthesis_model.id
                            );
                        }
                    },
                    Some(previous) => previous * 9 / 10,
                };
                tracing::warn!("Reducing findings to {next_budget} characters");
                findings = findings.chars().take(next_budget).collect();
                budget = Some(next_budget);
                current_retry += 1;
            }
            Err(err) => {
                return format!("Error generating final design document: {err}");
            }
        }
    }

    "Error generating final design document: Maximum retries exceeded".to_string()
}
