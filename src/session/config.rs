use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for one recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (used in chunk and output filenames)
    pub session_id: String,

    /// Total duration to record across all chunks, in seconds
    pub total_duration_secs: u64,

    /// Safety margin subtracted from a URL's remaining lifetime so a chunk
    /// never races its expiry mid-recording
    pub buffer_seconds: i64,

    /// Directory for chunk files and the merged output
    pub output_dir: PathBuf,

    /// Consecutive URL-provider failures tolerated before the session fails
    pub provider_max_retries: u32,

    /// Pause before re-fetching after an unusable URL or provider error
    pub retry_backoff: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("aircheck-{}", uuid::Uuid::new_v4()),
            total_duration_secs: 7200, // 2 hours
            buffer_seconds: 600,       // 10 minutes
            output_dir: PathBuf::from("./recordings"),
            provider_max_retries: 5,
            retry_backoff: Duration::from_secs(5),
        }
    }
}
