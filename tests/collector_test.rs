use ai_digest::types::*;
use ai_digest::{Collector, DigestStore, FetchSource};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::Once;
use tracing_subscriber;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

/// Stand-in fetcher that either yields fixed items or fails.
struct StubSource {
    kind: Source,
    items: Vec<NormalizedItem>,
    fail: bool,
}

impl StubSource {
    fn ok(kind: Source, items: Vec<NormalizedItem>) -> Box<dyn FetchSource> {
        Box::new(Self {
            kind,
            items,
            fail: false,
        })
    }

    fn failing(kind: Source) -> Box<dyn FetchSource> {
        Box::new(Self {
            kind,
            items: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl FetchSource for StubSource {
    fn source(&self) -> Source {
        self.kind
    }

    async fn fetch(&self, _window: &CollectionWindow) -> Result<Vec<NormalizedItem>> {
        if self.fail {
            Err(DigestError::Feed("stub fetch failure".to_string()))
        } else {
            Ok(self.items.clone())
        }
    }
}

fn paper(title: &str) -> NormalizedItem {
    NormalizedItem::Paper {
        title: title.to_string(),
        url: format!("https://arxiv.org/abs/{}", title),
        meta: "arXiv • A. Author".to_string(),
        summary: "An abstract.".to_string(),
        authors: vec!["A. Author".to_string()],
        published_at: Utc::now(),
        category: "cs.AI".to_string(),
    }
}

fn story(title: &str) -> NormalizedItem {
    NormalizedItem::Story {
        title: title.to_string(),
        url: format!("https://example.com/{}", title),
        meta: "Hacker News • 150 points • 30 comments".to_string(),
        score: 150,
        comment_count: 30,
        created_at: Utc::now(),
    }
}

fn discussion(title: &str) -> NormalizedItem {
    NormalizedItem::Discussion {
        title: title.to_string(),
        url: format!("https://reddit.com/r/test/{}", title),
        meta: "r/test • 90 upvotes • 20 comments".to_string(),
        score: 90,
        comment_count: 20,
        created_at: Utc::now(),
        community: "test".to_string(),
    }
}

/// Every subset of fetcher failures still yields a snapshot; only the
/// failed sources come back empty, and collect_all never errors.
#[tokio::test]
async fn all_failure_subsets_degrade_to_empty_lists() {
    init_tracing();

    for mask in 0u8..8 {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DigestStore::new(dir.path()).unwrap());

        let papers_fail = mask & 1 != 0;
        let stories_fail = mask & 2 != 0;
        let discussions_fail = mask & 4 != 0;

        let collector = Collector::with_sources(
            Some(if papers_fail {
                StubSource::failing(Source::Arxiv)
            } else {
                StubSource::ok(Source::Arxiv, vec![paper("p1")])
            }),
            Some(if stories_fail {
                StubSource::failing(Source::HackerNews)
            } else {
                StubSource::ok(Source::HackerNews, vec![story("s1")])
            }),
            Some(if discussions_fail {
                StubSource::failing(Source::Reddit)
            } else {
                StubSource::ok(Source::Reddit, vec![discussion("d1")])
            }),
            Arc::clone(&store),
        );

        let snapshot = collector
            .collect_all()
            .await
            .unwrap_or_else(|e| panic!("mask {} raised: {}", mask, e));

        assert_eq!(snapshot.papers.is_empty(), papers_fail, "mask {}", mask);
        assert_eq!(snapshot.stories.is_empty(), stories_fail, "mask {}", mask);
        assert_eq!(
            snapshot.discussions.is_empty(),
            discussions_fail,
            "mask {}",
            mask
        );
    }
}

#[tokio::test]
async fn all_sources_failing_is_not_an_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DigestStore::new(dir.path()).unwrap());

    let collector = Collector::with_sources(
        Some(StubSource::failing(Source::Arxiv)),
        Some(StubSource::failing(Source::HackerNews)),
        Some(StubSource::failing(Source::Reddit)),
        Arc::clone(&store),
    );

    let snapshot = collector.collect_all().await.unwrap();
    assert_eq!(snapshot.item_count(), 0);

    // The empty snapshot was still persisted for the curator.
    assert_eq!(store.load_latest_snapshot().unwrap(), snapshot);
}

#[tokio::test]
async fn merge_preserves_per_fetcher_ordering() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DigestStore::new(dir.path()).unwrap());

    let collector = Collector::with_sources(
        Some(StubSource::ok(Source::Arxiv, vec![paper("p1"), paper("p2")])),
        Some(StubSource::ok(
            Source::HackerNews,
            vec![story("s1"), story("s2")],
        )),
        Some(StubSource::ok(
            Source::Reddit,
            vec![discussion("d1"), discussion("d2")],
        )),
        Arc::clone(&store),
    );

    let snapshot = collector.collect_all().await.unwrap();

    let titles: Vec<&str> = snapshot.all_items().map(|i| i.title()).collect();
    assert_eq!(titles, vec!["p1", "p2", "s1", "s2", "d1", "d2"]);

    let window = snapshot.window_end - snapshot.window_start;
    assert_eq!(window, chrono::Duration::days(7));
}

#[tokio::test]
async fn disabled_sources_contribute_empty_lists() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DigestStore::new(dir.path()).unwrap());

    let collector = Collector::with_sources(
        None,
        Some(StubSource::ok(Source::HackerNews, vec![story("only")])),
        None,
        Arc::clone(&store),
    );

    let snapshot = collector.collect_all().await.unwrap();
    assert!(snapshot.papers.is_empty());
    assert_eq!(snapshot.stories.len(), 1);
    assert!(snapshot.discussions.is_empty());
}

#[tokio::test]
async fn persisted_snapshot_round_trips() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DigestStore::new(dir.path()).unwrap());

    let collector = Collector::with_sources(
        Some(StubSource::ok(Source::Arxiv, vec![paper("p1")])),
        Some(StubSource::ok(Source::HackerNews, vec![story("s1")])),
        Some(StubSource::ok(Source::Reddit, vec![discussion("d1")])),
        Arc::clone(&store),
    );

    let snapshot = collector.collect_all().await.unwrap();
    let reloaded = store.load_latest_snapshot().unwrap();
    assert_eq!(reloaded, snapshot);
}
