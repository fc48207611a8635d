use chrono::{DateTime, Duration, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The three independent origins items are collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "arxiv")]
    Arxiv,
    #[serde(rename = "hackernews")]
    HackerNews,
    #[serde(rename = "reddit")]
    Reddit,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Arxiv => write!(f, "arxiv"),
            Source::HackerNews => write!(f, "hackernews"),
            Source::Reddit => write!(f, "reddit"),
        }
    }
}

/// A single collected item, normalized per source kind.
///
/// The `source` tag doubles as the serde discriminator so snapshot files
/// carry the same `"source": "arxiv" | "hackernews" | "reddit"` field the
/// artifacts always had.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum NormalizedItem {
    #[serde(rename = "arxiv")]
    Paper {
        title: String,
        url: String,
        meta: String,
        summary: String,
        authors: Vec<String>,
        published_at: DateTime<Utc>,
        category: String,
    },
    #[serde(rename = "hackernews")]
    Story {
        title: String,
        url: String,
        meta: String,
        score: i64,
        comment_count: i64,
        created_at: DateTime<Utc>,
    },
    #[serde(rename = "reddit")]
    Discussion {
        title: String,
        url: String,
        meta: String,
        score: i64,
        comment_count: i64,
        created_at: DateTime<Utc>,
        community: String,
    },
}

impl NormalizedItem {
    pub fn source(&self) -> Source {
        match self {
            NormalizedItem::Paper { .. } => Source::Arxiv,
            NormalizedItem::Story { .. } => Source::HackerNews,
            NormalizedItem::Discussion { .. } => Source::Reddit,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            NormalizedItem::Paper { title, .. }
            | NormalizedItem::Story { title, .. }
            | NormalizedItem::Discussion { title, .. } => title,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            NormalizedItem::Paper { url, .. }
            | NormalizedItem::Story { url, .. }
            | NormalizedItem::Discussion { url, .. } => url,
        }
    }

    pub fn meta(&self) -> &str {
        match self {
            NormalizedItem::Paper { meta, .. }
            | NormalizedItem::Story { meta, .. }
            | NormalizedItem::Discussion { meta, .. } => meta,
        }
    }

    /// Abstract of the item, where the source provides one.
    pub fn summary(&self) -> Option<&str> {
        match self {
            NormalizedItem::Paper { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

/// Trailing 7-day interval bounding which items are eligible for collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CollectionWindow {
    pub fn trailing_week(end: DateTime<Utc>) -> Self {
        Self {
            start: end - Duration::days(7),
            end,
        }
    }

    /// Boundary-inclusive on the start side.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start
    }
}

/// Unfiltered, merged output of one collection run.
///
/// Per-source lists keep each fetcher's internal ordering; the lists
/// themselves are always in papers, stories, discussions order regardless
/// of which fetcher finished first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub papers: Vec<NormalizedItem>,
    pub stories: Vec<NormalizedItem>,
    pub discussions: Vec<NormalizedItem>,
    pub collected_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl RawSnapshot {
    pub fn item_count(&self) -> usize {
        self.papers.len() + self.stories.len() + self.discussions.len()
    }

    /// All items in fixed source order, for prompt assembly.
    pub fn all_items(&self) -> impl Iterator<Item = &NormalizedItem> {
        self.papers
            .iter()
            .chain(self.stories.iter())
            .chain(self.discussions.iter())
    }
}

/// One curated entry as selected and annotated by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedItem {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub meta: String,
    pub insight: String,
    /// Relevance rank, always within 1..=10 once validated.
    pub score: u8,
}

/// A named, ordered digest section.
#[derive(Debug, Clone, PartialEq)]
pub struct DigestSection {
    pub name: String,
    pub items: Vec<CuratedItem>,
}

/// Structured, model-derived summary produced from one raw snapshot.
///
/// Sections are stored as an ordered list but serialized as the JSON map
/// downstream renderers have always consumed:
/// `{"sections": {"<name>": [...]}, "weekly_summary": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedDigest {
    #[serde(with = "section_map")]
    pub sections: Vec<DigestSection>,
    pub weekly_summary: String,
}

impl CuratedDigest {
    pub fn section(&self, name: &str) -> Option<&DigestSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

mod section_map {
    use super::*;

    pub fn serialize<S>(
        sections: &[DigestSection],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(sections.len()))?;
        for section in sections {
            map.serialize_entry(&section.name, &section.items)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<DigestSection>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SectionMapVisitor;

        impl<'de> Visitor<'de> for SectionMapVisitor {
            type Value = Vec<DigestSection>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of section name to curated items")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut sections = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, items)) = access.next_entry::<String, Vec<CuratedItem>>()? {
                    sections.push(DigestSection { name, items });
                }
                Ok(sections)
            }
        }

        deserializer.deserialize_map(SectionMapVisitor)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    Feed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no raw snapshot available; run collection first")]
    MissingInput,

    #[error("LLM invocation failed: {0}")]
    LlmInvocation(String),

    #[error("could not recover structured data from LLM response: {reason}; offending text: {snippet}")]
    LlmResponseParse { reason: String, snippet: String },
}

pub type Result<T> = std::result::Result<T, DigestError>;
