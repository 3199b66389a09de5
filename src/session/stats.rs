use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final accounting for one recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session identifier
    pub session_id: String,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Seconds originally requested
    pub requested_secs: u64,

    /// Seconds covered by chunks that completed cleanly
    pub recorded_secs: u64,

    /// Chunks that recorded their full planned duration
    pub chunks_completed: usize,

    /// Chunks whose capture process failed
    pub chunks_failed: usize,

    /// Whether a stop request ended the session before the budget ran out
    pub stopped_early: bool,

    /// Path of the merged output, if a merge happened
    pub merged_output: Option<PathBuf>,

    /// Sequence numbers absent from the merged output
    pub missing_sequences: Vec<u32>,
}
