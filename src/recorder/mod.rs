use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::stop::StopFlag;

pub mod ffmpeg;

pub use ffmpeg::{FfmpegRecorder, RecorderConfig};

/// One bounded-duration recording segment on disk.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 1-based sequence number assigned by the session loop
    pub sequence: u32,
    /// File path the capture wrote (or attempted to write)
    pub path: PathBuf,
    /// When the capture started
    pub created_at: DateTime<Utc>,
}

/// What became of one recording window.
#[derive(Debug)]
pub enum ChunkOutcome {
    /// The capture ran for the full planned duration and exited cleanly
    Completed(Chunk),
    /// A stop request terminated the capture early; a partial file may exist
    Stopped(Chunk),
    /// The capture process exited abnormally; a partial file may exist
    Failed { chunk: Chunk, status: Option<i32> },
}

/// Bounded-duration capture of a signed stream URL into one chunk file.
///
/// The capture is an opaque external process: it either completes within the
/// duration bound or fails with an observable exit status. Failure is
/// non-fatal to a session; the schedule advances regardless.
#[async_trait::async_trait]
pub trait Recorder: Send + Sync {
    async fn record(
        &self,
        url: &str,
        duration_secs: u64,
        sequence: u32,
        stop: &StopFlag,
    ) -> Result<ChunkOutcome>;
}
