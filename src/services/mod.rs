//! Service layer: the pipeline stages and their shared prompts.

pub mod analyzer;
pub mod briefing;
pub mod compression;
pub mod pipeline;
pub mod prompts;
pub mod supervisor;
pub mod synthesis;

pub use analyzer::AnalyzerUnit;
pub use briefing::{BriefWriter, ClarificationGate, DesignBrief, GateOutcome};
pub use compression::compress_analysis;
pub use pipeline::{Pipeline, PipelineOutcome};
pub use supervisor::{overflow_rejection, Supervisor, SupervisorState};
pub use synthesis::generate_design_document;
