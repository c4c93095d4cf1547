//! Top-level pipeline wiring: gate, brief, supervisor, synthesis.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::config::RunConfig;
use crate::domain::models::conversation::{ConversationHistory, MessageEntry};
use crate::domain::ports::capability::CapabilityRegistry;
use crate::domain::ports::model_client::ModelClient;

use super::briefing::{BriefWriter, ClarificationGate, GateOutcome};
use super::supervisor::Supervisor;
use super::synthesis::generate_design_document;

/// Terminal artifact of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The run stopped to ask the user a clarifying question.
    NeedsClarification { question: String },
    /// The run completed; the document body may be an explanatory error
    /// string, but a document is always produced.
    Document {
        document: String,
        notes: Vec<String>,
        raw_transcripts: Vec<String>,
    },
}

/// The full design-document pipeline.
pub struct Pipeline {
    config: Arc<RunConfig>,
    model: Arc<dyn ModelClient>,
    registry: Arc<CapabilityRegistry>,
}

impl Pipeline {
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

    /// Run the pipeline on one user request.
    ///
    /// Pre-flight failures (clarification decision exhaustion, brief
    /// extraction failure, invalid repository reference) propagate; once
    /// the supervisor starts, the run always produces a document.
    pub async fn run(&self, request: &str) -> DomainResult<PipelineOutcome> {
        let mut history =
            ConversationHistory::from_entries(vec![MessageEntry::Human(request.to_string())]);

        let gate = ClarificationGate::new(Arc::clone(&self.config), Arc::clone(&self.model));
        if let GateOutcome::Clarify(question) = gate.evaluate(&mut history).await? {
            tracing::info!("Run requires clarification before analysis can start");
            return Ok(PipelineOutcome::NeedsClarification { question });
        }

        let writer = BriefWriter::new(Arc::clone(&self.config), Arc::clone(&self.model));
        let brief = writer.write(&history).await?;

        let supervisor = Supervisor::new(
            Arc::clone(&self.config),
            Arc::clone(&self.model),
            Arc::clone(&self.registry),
        );
        let seed = supervisor.seed_history(
            &brief.query.repo_url,
            &brief.query.design_brief,
            &brief.repo_setup,
        );
        let outcome = supervisor.run(seed).await;
        tracing::info!(
            "Supervisor collected {} notes across {} dispatch rounds",
            outcome.notes.len(),
            outcome.raw_transcripts.len()
        );

        let notes = outcome.notes.clone();
        let raw_transcripts = outcome.raw_transcripts.clone();
        let document = generate_design_document(
            self.model.as_ref(),
            &self.config,
            &brief.query.repo_url,
            &brief.query.design_brief,
            outcome,
        )
        .await;

        Ok(PipelineOutcome::Document {
            document,
            notes,
            raw_transcripts,
        })
    }
}
