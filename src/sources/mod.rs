pub mod arxiv;
pub mod hackernews;
pub mod reddit;

pub use arxiv::ArxivSource;
pub use hackernews::HackerNewsSource;
pub use reddit::RedditSource;

use crate::types::{CollectionWindow, NormalizedItem, Result, Source};
use async_trait::async_trait;
use std::time::Duration;

pub const USER_AGENT: &str = "AIWeeklyDigest/1.0";

/// Trait for fetching normalized items from one external source.
///
/// Implementations own their HTTP client and configuration; nothing is
/// shared process-wide. A returned error means the whole source degraded
/// for this run; the collector decides what to do with it.
#[async_trait]
pub trait FetchSource: Send + Sync {
    /// Which of the three sources this fetcher feeds; also tags its log
    /// lines.
    fn source(&self) -> Source;

    /// Fetch items eligible for the given collection window.
    async fn fetch(&self, window: &CollectionWindow) -> Result<Vec<NormalizedItem>>;
}

/// Build the HTTP client every fetcher uses: fixed seconds-scale timeout,
/// no retries.
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .gzip(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Truncate on a char boundary; fields are bounded to keep the downstream
/// prompt size in check.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
