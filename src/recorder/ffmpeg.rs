use std::fs;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::process::Command;
use tracing::{info, warn};

use super::{Chunk, ChunkOutcome, Recorder};
use crate::stop::StopFlag;

/// Settings for the ffmpeg capture subprocess.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory chunk files are written to
    pub output_dir: PathBuf,
    /// Session ID (used for chunk filenames)
    pub session_id: String,
    /// Audio codec passed to `-c:a`
    pub audio_codec: String,
    /// Audio bitrate passed to `-b:a`
    pub audio_bitrate: String,
}

impl RecorderConfig {
    pub fn new(session_id: String, output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            session_id,
            audio_codec: "libmp3lame".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// Records one chunk at a time by running a duration-bounded ffmpeg capture
/// against the signed URL. The `-t` bound is the only backpressure needed:
/// the process cannot outlive its window.
pub struct FfmpegRecorder {
    config: RecorderConfig,
}

impl FfmpegRecorder {
    pub fn new(config: RecorderConfig) -> Result<Self> {
        fs::create_dir_all(&config.output_dir)
            .context("Failed to create output directory")?;

        Ok(Self { config })
    }

    fn chunk_path(&self, sequence: u32) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        self.config.output_dir.join(format!(
            "{}_chunk{:03}_{}.mp3",
            self.config.session_id, sequence, timestamp
        ))
    }
}

#[async_trait::async_trait]
impl Recorder for FfmpegRecorder {
    async fn record(
        &self,
        url: &str,
        duration_secs: u64,
        sequence: u32,
        stop: &StopFlag,
    ) -> Result<ChunkOutcome> {
        let chunk = Chunk {
            sequence,
            path: self.chunk_path(sequence),
            created_at: Utc::now(),
        };

        info!(
            "Starting capture for chunk {}: {}s -> {}",
            sequence,
            duration_secs,
            chunk.path.display()
        );

        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(url)
            .args(["-t", &duration_secs.to_string()])
            .args(["-c:a", &self.config.audio_codec])
            .args(["-b:a", &self.config.audio_bitrate])
            .arg(&chunk.path)
            .stdin(Stdio::null())
            .spawn()
            .context("Failed to spawn ffmpeg")?;

        let waited = tokio::select! {
            status = child.wait() => Some(status.context("Failed to wait for ffmpeg")?),
            _ = stop.cancelled() => None,
        };

        match waited {
            Some(status) if status.success() => {
                info!("Chunk {} capture complete", sequence);
                Ok(ChunkOutcome::Completed(chunk))
            }
            Some(status) => {
                warn!("ffmpeg exited abnormally for chunk {}: {}", sequence, status);
                Ok(ChunkOutcome::Failed {
                    chunk,
                    status: status.code(),
                })
            }
            None => {
                warn!("Stop requested, terminating capture for chunk {}", sequence);
                child.kill().await.context("Failed to kill ffmpeg")?;
                Ok(ChunkOutcome::Stopped(chunk))
            }
        }
    }
}
