//! Model-backed summarization of long analysis reports.

use std::time::Duration;

use tokio::time::timeout;

use crate::domain::models::conversation::{ConversationHistory, MessageEntry};
use crate::domain::ports::model_client::{CompletionRequest, ModelClient};

/// Wall-clock ceiling for one summarization call.
const SUMMARY_TIMEOUT: Duration = Duration::from_secs(60);

/// Summarize a long analysis report with the given model.
///
/// This is the only place in the pipeline with a hard timeout: a summary
/// is an optimization, so on timeout or failure the raw content is
/// returned unchanged rather than failing the caller.
pub async fn summarize_analysis(
    client: &dyn ModelClient,
    model_id: &str,
    max_tokens: u32,
    analysis_content: &str,
) -> String {
    let prompt = format!(
        "Analyze the following repository information and provide a concise summary:\n\n\
         {analysis_content}\n\n\
         Please provide:\n\
         1. Key architectural patterns identified\n\
         2. Main technologies and frameworks used\n\
         3. Important files and directories\n\
         4. Potential areas for improvement or extension\n\n\
         Format as a structured summary."
    );

    let mut history = ConversationHistory::new();
    history.push(MessageEntry::Human(prompt));
    let request = CompletionRequest::text(model_id, max_tokens, history);

    match timeout(SUMMARY_TIMEOUT, client.complete(request)).await {
        Ok(Ok(turn)) => format!("<summary>\n{}\n</summary>", turn.content),
        Ok(Err(err)) => {
            tracing::error!("Failed to summarize analysis: {err}");
            analysis_content.to_string()
        }
        Err(_) => {
            tracing::error!("Summarization timed out after {SUMMARY_TIMEOUT:?}");
            analysis_content.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::conversation::AssistantTurn;
    use crate::domain::ports::model_client::ModelError;
    use async_trait::async_trait;

    struct FixedClient(Result<String, ModelError>);

    #[async_trait]
    impl ModelClient for FixedClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<AssistantTurn, ModelError> {
            self.0.clone().map(AssistantTurn::text)
        }
    }

    #[tokio::test]
    async fn test_summary_is_wrapped() {
        let client = FixedClient(Ok("three crates, one binary".to_string()));
        let summary = summarize_analysis(&client, "anthropic:test", 100, "long report").await;
        assert_eq!(summary, "<summary>\nthree crates, one binary\n</summary>");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_raw_content() {
        let client = FixedClient(Err(ModelError::Api("boom".into())));
        let summary = summarize_analysis(&client, "anthropic:test", 100, "long report").await;
        assert_eq!(summary, "long report");
    }
}
