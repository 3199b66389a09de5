use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use aircheck::{
    Config, FfmpegMerger, FfmpegRecorder, LiveApiProvider, RecorderConfig, RecordingSession,
    SessionConfig,
};

#[derive(Parser)]
#[command(name = "aircheck")]
#[command(about = "Record a live radio stream across signed-URL expiries")]
struct Args {
    /// Path to the config file, without extension
    #[arg(short, long, default_value = "config/aircheck")]
    config: String,

    /// Total recording duration in seconds (overrides config)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Live channel code (overrides config)
    #[arg(long)]
    channel: Option<u32>,

    /// Session identifier used in file names (default: random)
    #[arg(short, long)]
    session_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let output_dir = args.output_dir.unwrap_or(cfg.recording.output_dir);
    let output_dir = PathBuf::from(shellexpand::tilde(&output_dir).as_ref());
    let channel = args.channel.unwrap_or(cfg.stream.channel_code);

    let mut session_config = SessionConfig {
        total_duration_secs: args.duration.unwrap_or(cfg.recording.total_duration_seconds),
        buffer_seconds: cfg.stream.buffer_seconds,
        output_dir: output_dir.clone(),
        provider_max_retries: cfg.stream.provider_max_retries,
        retry_backoff: Duration::from_secs(cfg.stream.retry_backoff_seconds),
        ..SessionConfig::default()
    };
    if let Some(session_id) = args.session_id {
        session_config.session_id = session_id;
    }

    info!("{} starting", cfg.service.name);
    info!(
        "Session {}: {}s total, channel {}, output {}",
        session_config.session_id,
        session_config.total_duration_secs,
        channel,
        output_dir.display()
    );

    let provider = LiveApiProvider::new(cfg.stream.api_url, channel);
    let recorder = FfmpegRecorder::new(RecorderConfig {
        output_dir,
        session_id: session_config.session_id.clone(),
        audio_codec: cfg.recording.audio_codec,
        audio_bitrate: cfg.recording.audio_bitrate,
    })?;
    let merger = FfmpegMerger::new();

    let session = RecordingSession::new(
        session_config,
        Box::new(provider),
        Box::new(recorder),
        Box::new(merger),
    );

    let stop = session.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping the session");
            stop.stop();
        }
    });

    let report = session.run().await?;

    info!(
        "Recorded {}s of {}s requested ({} chunks complete, {} failed)",
        report.recorded_secs, report.requested_secs, report.chunks_completed, report.chunks_failed
    );
    if !report.missing_sequences.is_empty() {
        warn!(
            "Merged output has gaps at chunk(s) {:?}",
            report.missing_sequences
        );
    }
    match &report.merged_output {
        Some(path) => info!("Merged recording: {}", path.display()),
        None => warn!("No merged output was produced"),
    }

    Ok(())
}
