use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::UrlProvider;

/// Fetches signed stream URLs from the broadcaster's live-channel API.
///
/// The API returns a JSON body whose `channel_item[0].service_url` is a
/// signed URL with an embedded `Expires=` timestamp.
pub struct LiveApiProvider {
    client: Client,
    api_url: String,
    channel_code: u32,
}

#[derive(Deserialize)]
struct ChannelResponse {
    #[serde(default)]
    channel_item: Vec<ChannelItem>,
}

#[derive(Deserialize)]
struct ChannelItem {
    service_url: String,
}

impl LiveApiProvider {
    pub fn new(api_url: String, channel_code: u32) -> Self {
        Self {
            client: Client::new(),
            api_url,
            channel_code,
        }
    }
}

#[async_trait::async_trait]
impl UrlProvider for LiveApiProvider {
    async fn fetch_signed_url(&self) -> Result<String> {
        let url = format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            self.channel_code
        );
        debug!("Requesting signed URL from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Live API request failed")?;

        if !response.status().is_success() {
            bail!("Live API returned HTTP {}", response.status());
        }

        let body: ChannelResponse = response
            .json()
            .await
            .context("Live API returned unparseable JSON")?;

        let item = body
            .channel_item
            .into_iter()
            .next()
            .context("Live API response contains no channel items")?;

        info!(
            "Fetched signed stream URL for channel {}",
            self.channel_code
        );

        Ok(item.service_url)
    }
}
