//! Analyzer unit outputs and supervisor aggregates.

use serde::{Deserialize, Serialize};

/// The result of one analyzer unit: a deduplicated synthesis plus the
/// unmodified raw trail of its tool and assistant turns.
///
/// `raw` is kept even when compression degrades to a synthetic error, so
/// the trail is never silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub compressed: String,
    pub raw: String,
}

/// Everything the supervisor loop hands to final synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorOutcome {
    /// Ordered compressed note fragments collected from tool-result entries
    pub notes: Vec<String>,
    /// Raw transcript fragments, one per dispatch round
    pub raw_transcripts: Vec<String>,
}
