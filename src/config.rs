use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub stream: StreamConfig,
    pub recording: RecordingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamConfig {
    pub api_url: String,
    pub channel_code: u32,
    pub buffer_seconds: i64,
    pub provider_max_retries: u32,
    pub retry_backoff_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct RecordingConfig {
    pub output_dir: String,
    pub total_duration_seconds: u64,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
