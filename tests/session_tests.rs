// Integration tests for the session orchestrator.
//
// The provider, recorder, merger, and clock are all injected, so these
// tests verify the scheduling loop deterministically: no network, no
// subprocesses, no real delays.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use aircheck::{
    Chunk, ChunkOutcome, Clock, MergeError, MergeReport, Merger, Recorder, RecordingSession,
    SessionConfig, SessionError, StopFlag, UrlProvider,
};

const NOW: i64 = 1_700_000_000;
const BUFFER: i64 = 600;

fn signed_url(expires_at: i64) -> String {
    format!(
        "https://cdn.example.com/live.m3u8?Expires={}&Signature=sig",
        expires_at
    )
}

/// A URL whose safe window (after the buffer) is `safe_secs`.
fn url_with_safe_window(safe_secs: i64) -> String {
    signed_url(NOW + BUFFER + safe_secs)
}

fn test_config(total_secs: u64) -> SessionConfig {
    SessionConfig {
        session_id: "test-session".to_string(),
        total_duration_secs: total_secs,
        buffer_seconds: BUFFER,
        output_dir: PathBuf::from("/tmp/aircheck-test"),
        provider_max_retries: 3,
        retry_backoff: Duration::ZERO,
    }
}

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl UrlProvider for ScriptedProvider {
    async fn fetch_signed_url(&self) -> Result<String> {
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(url)) => Ok(url),
            Some(Err(msg)) => Err(anyhow::anyhow!(msg)),
            None => panic!("provider called more times than scripted"),
        }
    }
}

#[derive(Clone, Default)]
struct MockRecorder {
    calls: Arc<Mutex<Vec<(u32, u64)>>>,
    fail_sequences: Vec<u32>,
    error_sequences: Vec<u32>,
    stop_on_sequence: Option<u32>,
}

#[async_trait]
impl Recorder for MockRecorder {
    async fn record(
        &self,
        _url: &str,
        duration_secs: u64,
        sequence: u32,
        stop: &StopFlag,
    ) -> Result<ChunkOutcome> {
        self.calls.lock().unwrap().push((sequence, duration_secs));

        if self.error_sequences.contains(&sequence) {
            return Err(anyhow::anyhow!("failed to spawn capture process"));
        }

        let chunk = Chunk {
            sequence,
            path: PathBuf::from(format!("/tmp/aircheck-test/chunk{:03}.mp3", sequence)),
            created_at: Utc::now(),
        };

        if self.stop_on_sequence == Some(sequence) {
            stop.stop();
            return Ok(ChunkOutcome::Stopped(chunk));
        }
        if self.fail_sequences.contains(&sequence) {
            return Ok(ChunkOutcome::Failed {
                chunk,
                status: Some(1),
            });
        }
        Ok(ChunkOutcome::Completed(chunk))
    }
}

#[derive(Clone, Default)]
struct MockMerger {
    calls: Arc<Mutex<Vec<Vec<u32>>>>,
    fail: bool,
}

#[async_trait]
impl Merger for MockMerger {
    async fn merge(
        &self,
        chunks: &[Chunk],
        output_path: &Path,
    ) -> Result<MergeReport, MergeError> {
        let sequences: Vec<u32> = chunks.iter().map(|c| c.sequence).collect();
        self.calls.lock().unwrap().push(sequences.clone());

        if self.fail {
            return Err(MergeError::ConcatFailed {
                detail: "scripted failure".to_string(),
                retained: chunks.len(),
                dir: PathBuf::from("/tmp/aircheck-test"),
            });
        }
        Ok(MergeReport {
            output_path: output_path.to_path_buf(),
            merged: sequences,
            missing: Vec::new(),
        })
    }
}

fn session(
    config: SessionConfig,
    provider: ScriptedProvider,
    recorder: MockRecorder,
    merger: MockMerger,
) -> RecordingSession {
    RecordingSession::with_clock(
        config,
        Box::new(provider),
        Box::new(recorder),
        Box::new(merger),
        Box::new(FixedClock(NOW)),
    )
}

#[tokio::test]
async fn three_windows_cover_the_budget_and_merge_once() -> Result<()> {
    // 10s total against URLs that each allow 4s of safe recording
    let provider = ScriptedProvider::new(vec![
        Ok(url_with_safe_window(4)),
        Ok(url_with_safe_window(4)),
        Ok(url_with_safe_window(4)),
    ]);
    let recorder = MockRecorder::default();
    let merger = MockMerger::default();

    let report = session(test_config(10), provider, recorder.clone(), merger.clone())
        .run()
        .await?;

    let calls = recorder.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![(1, 4), (2, 4), (3, 2)]);
    assert_eq!(
        calls.iter().map(|(_, d)| d).sum::<u64>(),
        10,
        "planned durations must cover exactly the requested total"
    );

    let merges = merger.calls.lock().unwrap().clone();
    assert_eq!(merges, vec![vec![1, 2, 3]], "merger invoked exactly once");

    assert_eq!(report.recorded_secs, 10);
    assert_eq!(report.chunks_completed, 3);
    assert_eq!(report.chunks_failed, 0);
    assert!(!report.stopped_early);
    assert!(report.merged_output.is_some());
    Ok(())
}

#[tokio::test]
async fn malformed_url_is_discarded_without_consuming_budget() -> Result<()> {
    let provider = ScriptedProvider::new(vec![
        Ok("https://cdn.example.com/live.m3u8?Signature=only".to_string()),
        Ok(url_with_safe_window(10_000)),
    ]);
    let recorder = MockRecorder::default();
    let merger = MockMerger::default();

    let report = session(test_config(10), provider, recorder.clone(), merger)
        .run()
        .await?;

    // One full-budget chunk: the malformed attempt cost nothing
    assert_eq!(recorder.calls.lock().unwrap().clone(), vec![(1, 10)]);
    assert_eq!(report.recorded_secs, 10);
    Ok(())
}

#[tokio::test]
async fn unusable_window_backs_off_and_refetches() -> Result<()> {
    // First URL expires within the buffer (500 - 600 < 0)
    let provider = ScriptedProvider::new(vec![
        Ok(signed_url(NOW + 500)),
        Ok(url_with_safe_window(10_000)),
    ]);
    let recorder = MockRecorder::default();
    let merger = MockMerger::default();

    let report = session(test_config(10), provider, recorder.clone(), merger)
        .run()
        .await?;

    assert_eq!(recorder.calls.lock().unwrap().clone(), vec![(1, 10)]);
    assert_eq!(report.chunks_completed, 1);
    Ok(())
}

#[tokio::test]
async fn persistent_provider_failure_fails_the_session() {
    let provider = ScriptedProvider::new(vec![
        Err("connection refused".to_string()),
        Err("connection refused".to_string()),
        Err("connection refused".to_string()),
    ]);
    let recorder = MockRecorder::default();
    let merger = MockMerger::default();

    let result = session(test_config(10), provider, recorder, merger.clone())
        .run()
        .await;

    assert!(matches!(
        result,
        Err(SessionError::ProviderExhausted { attempts: 3, .. })
    ));
    assert!(
        merger.calls.lock().unwrap().is_empty(),
        "no merge after a provider-fatal session"
    );
}

#[tokio::test]
async fn provider_recovers_after_transient_failures() -> Result<()> {
    // Failures are counted consecutively; a success resets the count
    let provider = ScriptedProvider::new(vec![
        Err("timeout".to_string()),
        Ok(url_with_safe_window(5)),
        Err("timeout".to_string()),
        Err("timeout".to_string()),
        Ok(url_with_safe_window(5)),
    ]);
    let recorder = MockRecorder::default();
    let merger = MockMerger::default();

    let report = session(test_config(10), provider, recorder.clone(), merger)
        .run()
        .await?;

    assert_eq!(recorder.calls.lock().unwrap().clone(), vec![(1, 5), (2, 5)]);
    assert_eq!(report.chunks_completed, 2);
    Ok(())
}

#[tokio::test]
async fn recorder_failure_keeps_the_schedule_advancing() -> Result<()> {
    let provider = ScriptedProvider::new(vec![
        Ok(url_with_safe_window(4)),
        Ok(url_with_safe_window(4)),
        Ok(url_with_safe_window(4)),
    ]);
    let recorder = MockRecorder {
        fail_sequences: vec![2],
        ..MockRecorder::default()
    };
    let merger = MockMerger::default();

    let report = session(test_config(10), provider, recorder.clone(), merger.clone())
        .run()
        .await?;

    // Sequence numbers stay gap-free despite the failure
    assert_eq!(
        recorder.calls.lock().unwrap().clone(),
        vec![(1, 4), (2, 4), (3, 2)]
    );
    assert_eq!(report.chunks_completed, 2);
    assert_eq!(report.chunks_failed, 1);
    // Only the two clean chunks count: 4s + 2s
    assert_eq!(report.recorded_secs, 6);

    // The failed chunk's record is still handed to the merger, which
    // decides presence by looking at the filesystem
    assert_eq!(merger.calls.lock().unwrap().clone(), vec![vec![1, 2, 3]]);
    Ok(())
}

#[tokio::test]
async fn capture_error_still_surfaces_its_gap() -> Result<()> {
    let provider = ScriptedProvider::new(vec![
        Ok(url_with_safe_window(4)),
        Ok(url_with_safe_window(4)),
        Ok(url_with_safe_window(4)),
    ]);
    let recorder = MockRecorder {
        error_sequences: vec![2],
        ..MockRecorder::default()
    };
    let merger = MockMerger::default();

    let report = session(test_config(10), provider, recorder.clone(), merger.clone())
        .run()
        .await?;

    assert_eq!(report.chunks_completed, 2);
    assert_eq!(report.chunks_failed, 1);
    assert_eq!(report.recorded_secs, 6);

    // A spawn-level error produces no file, but its record still reaches
    // the merger so the gap shows up like any other missing chunk
    assert_eq!(merger.calls.lock().unwrap().clone(), vec![vec![1, 2, 3]]);
    Ok(())
}

#[tokio::test]
async fn stop_mid_chunk_merges_what_exists() -> Result<()> {
    let provider = ScriptedProvider::new(vec![Ok(url_with_safe_window(4))]);
    let recorder = MockRecorder {
        stop_on_sequence: Some(1),
        ..MockRecorder::default()
    };
    let merger = MockMerger::default();

    let report = session(test_config(10), provider, recorder.clone(), merger.clone())
        .run()
        .await?;

    assert_eq!(recorder.calls.lock().unwrap().clone(), vec![(1, 4)]);
    assert!(report.stopped_early);
    assert_eq!(report.chunks_completed, 0);
    // The partial chunk still goes to the merger
    assert_eq!(merger.calls.lock().unwrap().clone(), vec![vec![1]]);
    Ok(())
}

#[tokio::test]
async fn merge_failure_surfaces_with_the_retained_directory() {
    let provider = ScriptedProvider::new(vec![Ok(url_with_safe_window(10_000))]);
    let recorder = MockRecorder::default();
    let merger = MockMerger {
        fail: true,
        ..MockMerger::default()
    };

    let config = test_config(10);
    let output_dir = config.output_dir.clone();
    let result = session(config, provider, recorder, merger).run().await;

    match result {
        Err(SessionError::MergeFailed { dir, .. }) => assert_eq!(dir, output_dir),
        other => panic!("expected MergeFailed, got {:?}", other.map(|r| r.session_id)),
    }
}
