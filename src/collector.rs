use crate::config::SourcesConfig;
use crate::sources::{ArxivSource, FetchSource, HackerNewsSource, RedditSource};
use crate::store::DigestStore;
use crate::types::{CollectionWindow, NormalizedItem, RawSnapshot, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Fans out to the enabled source fetchers concurrently, isolates
/// per-source failures, merges results in fixed source order, and persists
/// the resulting snapshot.
pub struct Collector {
    papers: Option<Box<dyn FetchSource>>,
    stories: Option<Box<dyn FetchSource>>,
    discussions: Option<Box<dyn FetchSource>>,
    store: Arc<DigestStore>,
}

impl Collector {
    pub fn from_config(config: &SourcesConfig, store: Arc<DigestStore>) -> Self {
        let papers = config
            .arxiv
            .enabled
            .then(|| Box::new(ArxivSource::new(config.arxiv.clone())) as Box<dyn FetchSource>);
        let stories = config.hackernews.enabled.then(|| {
            Box::new(HackerNewsSource::new(config.hackernews.clone())) as Box<dyn FetchSource>
        });
        let discussions = config
            .reddit
            .enabled
            .then(|| Box::new(RedditSource::new(config.reddit.clone())) as Box<dyn FetchSource>);

        Self::with_sources(papers, stories, discussions, store)
    }

    /// Explicit wiring, used directly by tests with stand-in fetchers.
    pub fn with_sources(
        papers: Option<Box<dyn FetchSource>>,
        stories: Option<Box<dyn FetchSource>>,
        discussions: Option<Box<dyn FetchSource>>,
        store: Arc<DigestStore>,
    ) -> Self {
        Self {
            papers,
            stories,
            discussions,
            store,
        }
    }

    /// Collect from all enabled sources and persist the snapshot keyed by
    /// the run date.
    ///
    /// Fetchers run concurrently and are joined wait-all; a failing
    /// fetcher degrades to an empty list and is logged, never raised. An
    /// all-sources-failed run still yields a (fully empty) snapshot.
    pub async fn collect_all(&self) -> Result<RawSnapshot> {
        let collected_at = Utc::now();
        let window = CollectionWindow::trailing_week(collected_at);
        info!(
            "Starting collection for window {} .. {}",
            window.start, window.end
        );

        let (papers, stories, discussions) = tokio::join!(
            run_fetcher(self.papers.as_deref(), &window),
            run_fetcher(self.stories.as_deref(), &window),
            run_fetcher(self.discussions.as_deref(), &window),
        );

        let snapshot = RawSnapshot {
            papers,
            stories,
            discussions,
            collected_at,
            window_start: window.start,
            window_end: window.end,
        };

        self.store
            .save_snapshot(&snapshot, collected_at.date_naive())?;
        info!("Collection complete: {} items", snapshot.item_count());
        Ok(snapshot)
    }
}

/// Run one fetcher, degrading any failure to an empty contribution.
async fn run_fetcher(
    fetcher: Option<&dyn FetchSource>,
    window: &CollectionWindow,
) -> Vec<NormalizedItem> {
    let Some(fetcher) = fetcher else {
        return Vec::new();
    };

    match fetcher.fetch(window).await {
        Ok(items) => {
            info!("{}: collected {} items", fetcher.source(), items.len());
            items
        }
        Err(e) => {
            warn!("{} failed, contributing no items: {}", fetcher.source(), e);
            Vec::new()
        }
    }
}
