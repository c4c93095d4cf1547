//! Compression stage: reduce an analyzer unit's full history into a
//! deduplicated technical report.
//!
//! This is a lossless reformatting pass, not a summarizer; the prompt
//! instructs the model to preserve technical specifics verbatim and drop
//! only redundancy. Context overflows are handled by pruning the history
//! back through the last assistant turn and retrying, bounded at three
//! attempts.

use crate::domain::models::config::ModelConfig;
use crate::domain::models::conversation::{ConversationHistory, MessageEntry};
use crate::domain::models::report::AnalysisReport;
use crate::domain::ports::model_client::{CompletionRequest, ModelClient};

use super::prompts;

const MAX_SYNTHESIS_ATTEMPTS: u32 = 3;

const RETRIES_EXHAUSTED: &str = "Error synthesizing analysis report: Maximum retries exceeded";

/// Compress a unit's history into an [`AnalysisReport`].
///
/// Never fails: every error path degrades to a synthetic report whose
/// `raw` field still carries the unit's transcript.
pub async fn compress_analysis(
    model: &dyn ModelClient,
    model_config: &ModelConfig,
    mut history: ConversationHistory,
) -> AnalysisReport {
    history.replace_system(prompts::compression_system_prompt(&prompts::today_str()));
    history.push(MessageEntry::Human(prompts::COMPRESSION_DIRECTIVE.to_string()));

    let mut attempts = 0;
    while attempts < MAX_SYNTHESIS_ATTEMPTS {
        let request = CompletionRequest::text(
            model_config.id.clone(),
            model_config.max_output_tokens,
            history.clone(),
        );

        match model.complete(request).await {
            Ok(turn) => {
                return AnalysisReport {
                    compressed: turn.content,
                    raw: raw_trail(&history),
                };
            }
            Err(err) if err.is_context_limit() => {
                attempts += 1;
                tracing::warn!(
                    "Token limit exceeded while synthesizing (attempt {attempts}): {err}. \
                     Pruning the messages to try again."
                );
                history = history.drop_through_last_assistant();
            }
            Err(err) => {
                tracing::error!("Error synthesizing analysis report: {err}");
                return AnalysisReport {
                    compressed: format!("Error synthesizing analysis report: {err}"),
                    raw: raw_trail(&history),
                };
            }
        }
    }

    AnalysisReport {
        compressed: RETRIES_EXHAUSTED.to_string(),
        raw: raw_trail(&history),
    }
}

/// The unmodified tool/assistant transcript, falling back to the full
/// history rendering so the raw trail is never empty.
fn raw_trail(history: &ConversationHistory) -> String {
    let raw = history.raw_transcript();
    if raw.is_empty() {
        history.buffer_string()
    } else {
        raw
    }
}
