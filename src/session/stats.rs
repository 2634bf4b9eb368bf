use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::FinalizeTrigger;

/// A live session as seen by the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSession {
    /// Session identifier, also the persistence key
    pub session_id: String,

    /// When the connection was accepted
    pub started_at: DateTime<Utc>,
}

/// Outcome of a finalized session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,

    /// Space-joined transcript segments (empty if nothing was recognized)
    pub transcript: String,

    pub word_count: usize,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Number of finalized segments, including trailing flushed text
    pub segments_count: usize,

    pub audio_chunks_received: u64,

    pub trigger: FinalizeTrigger,

    /// Whether the store accepted the record
    pub persisted: bool,
}
