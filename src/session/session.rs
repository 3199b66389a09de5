use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use super::clock::{Clock, SystemClock};
use super::config::SessionConfig;
use super::error::SessionError;
use super::stats::SessionReport;
use crate::merger::Merger;
use crate::planner::{plan_window, WindowPlan};
use crate::provider::{extract_expiry, UrlProvider};
use crate::recorder::{Chunk, ChunkOutcome, Recorder};
use crate::stop::StopFlag;

/// Mutable scheduling state, owned exclusively by the session loop.
#[derive(Debug)]
struct SessionState {
    remaining_secs: u64,
    next_sequence: u32,
}

impl SessionState {
    fn new(total_secs: u64) -> Self {
        Self {
            remaining_secs: total_secs,
            next_sequence: 1,
        }
    }

    /// Advance past one recording window. The budget drops by the planned
    /// (not measured) duration regardless of the capture outcome, so a dead
    /// stream cannot stall the schedule; the sequence stays gap-free.
    fn advance(&mut self, planned_secs: u64) {
        self.remaining_secs = self.remaining_secs.saturating_sub(planned_secs);
        self.next_sequence += 1;
    }
}

/// Drives the planning/recording loop until the requested total duration is
/// exhausted, then merges the chunks into one continuous file.
///
/// Exactly one capture subprocess runs at a time; recording windows are
/// non-overlapping portions of the total duration by construction.
pub struct RecordingSession {
    config: SessionConfig,
    provider: Box<dyn UrlProvider>,
    recorder: Box<dyn Recorder>,
    merger: Box<dyn Merger>,
    clock: Box<dyn Clock>,
    stop: Arc<StopFlag>,
}

impl RecordingSession {
    pub fn new(
        config: SessionConfig,
        provider: Box<dyn UrlProvider>,
        recorder: Box<dyn Recorder>,
        merger: Box<dyn Merger>,
    ) -> Self {
        Self::with_clock(config, provider, recorder, merger, Box::new(SystemClock))
    }

    /// Like `new`, with an explicit time source for deterministic tests.
    pub fn with_clock(
        config: SessionConfig,
        provider: Box<dyn UrlProvider>,
        recorder: Box<dyn Recorder>,
        merger: Box<dyn Merger>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            config,
            provider,
            recorder,
            merger,
            clock,
            stop: Arc::new(StopFlag::new()),
        }
    }

    /// Handle for requesting a stop from outside the session (e.g. Ctrl+C).
    pub fn stop_flag(&self) -> Arc<StopFlag> {
        Arc::clone(&self.stop)
    }

    /// Run the session to completion: record chunks until the budget is
    /// exhausted (or a stop is requested), then merge.
    pub async fn run(self) -> Result<SessionReport, SessionError> {
        let started_at = Utc::now();
        let mut state = SessionState::new(self.config.total_duration_secs);
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut chunks_completed = 0usize;
        let mut chunks_failed = 0usize;
        let mut recorded_secs = 0u64;
        let mut provider_failures = 0u32;
        let mut stopped_early = false;

        info!(
            "Starting recording session {}: {}s requested, {}s safety buffer",
            self.config.session_id, state.remaining_secs, self.config.buffer_seconds
        );

        while state.remaining_secs > 0 {
            if self.stop.is_stopped() {
                info!("Stop requested, ending recording loop");
                stopped_early = true;
                break;
            }

            let url = match self.provider.fetch_signed_url().await {
                Ok(url) => {
                    provider_failures = 0;
                    url
                }
                Err(e) => {
                    provider_failures += 1;
                    if provider_failures >= self.config.provider_max_retries {
                        return Err(SessionError::ProviderExhausted {
                            attempts: provider_failures,
                            source: e,
                        });
                    }
                    warn!(
                        "URL provider failed (attempt {}/{}): {:#}",
                        provider_failures, self.config.provider_max_retries, e
                    );
                    self.backoff().await;
                    continue;
                }
            };

            // A URL without a parseable expiry cannot be trusted for
            // planning; treat it like an unusable window.
            let expires_at = match extract_expiry(&url) {
                Ok(timestamp) => timestamp,
                Err(e) => {
                    warn!("Discarding signed URL: {}", e);
                    self.backoff().await;
                    continue;
                }
            };

            let now = self.clock.now_unix();
            let duration = match plan_window(
                expires_at,
                now,
                self.config.buffer_seconds,
                state.remaining_secs,
            ) {
                WindowPlan::Unusable => {
                    warn!(
                        "Signed URL expires too soon ({}s left, {}s buffer), fetching another",
                        expires_at - now,
                        self.config.buffer_seconds
                    );
                    self.backoff().await;
                    continue;
                }
                WindowPlan::Usable(duration) => duration,
            };

            info!(
                "Recording chunk {} for {}s (URL expires in {}s, {}s of budget left)",
                state.next_sequence,
                duration,
                expires_at - now,
                state.remaining_secs
            );

            match self
                .recorder
                .record(&url, duration, state.next_sequence, &self.stop)
                .await
            {
                Ok(ChunkOutcome::Completed(chunk)) => {
                    info!("Chunk {} saved: {}", chunk.sequence, chunk.path.display());
                    chunks_completed += 1;
                    recorded_secs += duration;
                    chunks.push(chunk);
                }
                Ok(ChunkOutcome::Stopped(chunk)) => {
                    warn!(
                        "Chunk {} interrupted by stop request, keeping partial file",
                        chunk.sequence
                    );
                    chunks.push(chunk);
                    stopped_early = true;
                }
                Ok(ChunkOutcome::Failed { chunk, status }) => {
                    error!(
                        "Capture exited abnormally for chunk {} (status {:?}), continuing",
                        chunk.sequence, status
                    );
                    chunks_failed += 1;
                    // A partial file may still exist; the merger checks.
                    chunks.push(chunk);
                }
                Err(e) => {
                    error!(
                        "Capture error for chunk {}: {:#}, continuing",
                        state.next_sequence, e
                    );
                    chunks_failed += 1;
                    // No file was created; the merger reports this gap like
                    // any other missing chunk.
                    chunks.push(Chunk {
                        sequence: state.next_sequence,
                        path: self.config.output_dir.join(format!(
                            "{}_chunk{:03}",
                            self.config.session_id, state.next_sequence
                        )),
                        created_at: Utc::now(),
                    });
                }
            }

            state.advance(duration);

            if stopped_early {
                break;
            }
        }

        info!(
            "Recording loop finished: {} chunks attempted, {}s of {}s completed",
            chunks.len(),
            recorded_secs,
            self.config.total_duration_secs
        );

        let mut report = SessionReport {
            session_id: self.config.session_id.clone(),
            started_at,
            requested_secs: self.config.total_duration_secs,
            recorded_secs,
            chunks_completed,
            chunks_failed,
            stopped_early,
            merged_output: None,
            missing_sequences: Vec::new(),
        };

        if chunks.is_empty() {
            warn!("No chunks were produced, nothing to merge");
            return Ok(report);
        }

        let output_path = self.config.output_dir.join(format!(
            "{}_full_{}.mp3",
            self.config.session_id,
            started_at.format("%Y%m%d_%H%M")
        ));

        match self.merger.merge(&chunks, &output_path).await {
            Ok(merge) => {
                info!("Session complete: {}", merge.output_path.display());
                report.merged_output = Some(merge.output_path);
                report.missing_sequences = merge.missing;
                Ok(report)
            }
            Err(source) => {
                error!(
                    "Merge failed, chunk files retained in {}: {}",
                    self.config.output_dir.display(),
                    source
                );
                Err(SessionError::MergeFailed {
                    dir: self.config.output_dir.clone(),
                    source,
                })
            }
        }
    }

    /// Bounded pause before re-fetching a URL. Interruptible by the stop
    /// flag; never charged against the recording budget.
    async fn backoff(&self) {
        tokio::select! {
            _ = tokio::time::sleep(self.config.retry_backoff) => {}
            _ = self.stop.cancelled() => {}
        }
    }
}
