use super::{http_client, FetchSource};
use crate::config::HackerNewsConfig;
use crate::types::{CollectionWindow, NormalizedItem, Result, Source};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const TOP_STORIES_URL: &str = "https://hacker-news.firebaseio.com/v0/topstories.json";
const ITEM_URL: &str = "https://hacker-news.firebaseio.com/v0/item";
const CANDIDATE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct HnItem {
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    descendants: i64,
    #[serde(default)]
    time: i64,
}

/// Story fetcher: walks the Hacker News top-story ranking and keeps
/// stories whose title matches a configured keyword and whose score meets
/// the configured minimum.
pub struct HackerNewsSource {
    config: HackerNewsConfig,
    keywords: Vec<String>,
    client: reqwest::Client,
}

impl HackerNewsSource {
    pub fn new(config: HackerNewsConfig) -> Self {
        let keywords = config.keywords.iter().map(|k| k.to_lowercase()).collect();
        Self {
            config,
            keywords,
            client: http_client(10),
        }
    }

    /// Inclusion rule: case-insensitive keyword substring match on the
    /// title AND score at or above the configured minimum.
    pub fn accepts(&self, title: &str, score: i64) -> bool {
        if score < self.config.min_score {
            return false;
        }
        let title_lower = title.to_lowercase();
        self.keywords.iter().any(|k| title_lower.contains(k))
    }

    fn normalize(&self, id: u64, item: HnItem) -> Option<NormalizedItem> {
        let title = item.title?;
        if !self.accepts(&title, item.score) {
            return None;
        }

        // Ask/Show HN stories have no external URL; link the HN thread.
        let url = item
            .url
            .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", id));
        let created_at: DateTime<Utc> = Utc
            .timestamp_opt(item.time, 0)
            .single()
            .unwrap_or_else(Utc::now);

        Some(NormalizedItem::Story {
            meta: format!(
                "Hacker News • {} points • {} comments",
                item.score, item.descendants
            ),
            title,
            url,
            score: item.score,
            comment_count: item.descendants,
            created_at,
        })
    }

    async fn fetch_item(&self, id: u64) -> Result<HnItem> {
        let item = self
            .client
            .get(format!("{}/{}.json", ITEM_URL, id))
            .timeout(Duration::from_secs(5))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(item)
    }
}

#[async_trait]
impl FetchSource for HackerNewsSource {
    fn source(&self) -> Source {
        Source::HackerNews
    }

    async fn fetch(&self, _window: &CollectionWindow) -> Result<Vec<NormalizedItem>> {
        let ids: Vec<u64> = self
            .client
            .get(TOP_STORIES_URL)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut stories = Vec::new();
        for id in ids.into_iter().take(CANDIDATE_LIMIT) {
            if stories.len() >= self.config.max_items {
                break;
            }

            // One bad story detail should not cost us the rest of the list.
            match self.fetch_item(id).await {
                Ok(item) => {
                    if let Some(story) = self.normalize(id, item) {
                        debug!("Matched HN story: {}", story.title());
                        stories.push(story);
                    }
                }
                Err(e) => warn!("Skipping HN item {}: {}", id, e),
            }
        }

        info!("Found {} relevant stories on Hacker News", stories.len());
        Ok(stories)
    }
}
