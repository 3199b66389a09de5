use anyhow::Result;

pub mod expiry;
pub mod http;

pub use expiry::{extract_expiry, MalformedUrl};
pub use http::LiveApiProvider;

/// Supplies a fresh signed stream URL on demand.
///
/// The scheduler depends only on this capability; whether the URL comes from
/// an HTTP API, browser automation, or a test fixture is the
/// implementation's business. The returned string must carry a parseable
/// `Expires=` field to be usable for window planning.
#[async_trait::async_trait]
pub trait UrlProvider: Send + Sync {
    async fn fetch_signed_url(&self) -> Result<String>;
}
