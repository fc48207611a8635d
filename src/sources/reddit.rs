use super::{http_client, FetchSource};
use crate::config::RedditConfig;
use crate::types::{CollectionWindow, NormalizedItem, Result, Source};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    title: String,
    permalink: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    created_utc: f64,
}

/// Discussion fetcher: top-of-week listing per configured subreddit,
/// filtered by minimum score. One failing subreddit never takes down the
/// others.
pub struct RedditSource {
    config: RedditConfig,
    client: reqwest::Client,
}

impl RedditSource {
    pub fn new(config: RedditConfig) -> Self {
        Self {
            config,
            client: http_client(10),
        }
    }

    fn listing_url(&self, subreddit: &str) -> String {
        format!(
            "https://www.reddit.com/r/{}/top.json?t=week&limit={}",
            subreddit, self.config.max_items
        )
    }

    fn normalize(&self, subreddit: &str, listing: Listing) -> Vec<NormalizedItem> {
        listing
            .data
            .children
            .into_iter()
            .take(self.config.max_items)
            .filter(|child| child.data.score >= self.config.min_score)
            .map(|child| {
                let post = child.data;
                let created_at: DateTime<Utc> = Utc
                    .timestamp_opt(post.created_utc as i64, 0)
                    .single()
                    .unwrap_or_else(Utc::now);

                NormalizedItem::Discussion {
                    meta: format!(
                        "r/{} • {} upvotes • {} comments",
                        subreddit, post.score, post.num_comments
                    ),
                    title: post.title,
                    url: format!("https://reddit.com{}", post.permalink),
                    score: post.score,
                    comment_count: post.num_comments,
                    created_at,
                    community: subreddit.to_string(),
                }
            })
            .collect()
    }

    async fn fetch_subreddit(&self, subreddit: &str) -> Result<Vec<NormalizedItem>> {
        let listing: Listing = self
            .client
            .get(self.listing_url(subreddit))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(self.normalize(subreddit, listing))
    }
}

#[async_trait]
impl FetchSource for RedditSource {
    fn source(&self) -> Source {
        Source::Reddit
    }

    async fn fetch(&self, _window: &CollectionWindow) -> Result<Vec<NormalizedItem>> {
        let mut posts = Vec::new();

        for subreddit in &self.config.subreddits {
            match self.fetch_subreddit(subreddit).await {
                Ok(mut found) => posts.append(&mut found),
                Err(e) => warn!("Error collecting from r/{}: {}", subreddit, e),
            }
        }

        info!("Found {} relevant posts on Reddit", posts.len());
        Ok(posts)
    }
}
