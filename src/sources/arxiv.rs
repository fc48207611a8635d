use super::{http_client, truncate_chars, FetchSource};
use crate::config::ArxivConfig;
use crate::types::{CollectionWindow, DigestError, NormalizedItem, Result, Source};
use async_trait::async_trait;
use feed_rs::parser;
use tracing::{debug, info};

const ARXIV_API: &str = "http://export.arxiv.org/api/query";
const SUMMARY_MAX_CHARS: usize = 300;
const MAX_AUTHORS: usize = 3;

/// Paper fetcher: queries the arXiv Atom API per configured category,
/// newest submissions first, and keeps papers published inside the window.
pub struct ArxivSource {
    config: ArxivConfig,
    client: reqwest::Client,
}

impl ArxivSource {
    pub fn new(config: ArxivConfig) -> Self {
        Self {
            config,
            client: http_client(10),
        }
    }

    fn query_url(&self, category: &str) -> String {
        format!(
            "{}?search_query=cat:{}&sortBy=submittedDate&sortOrder=descending&max_results={}",
            ARXIV_API, category, self.config.max_papers
        )
    }

    fn parse_category_feed(
        &self,
        category: &str,
        body: &str,
        window: &CollectionWindow,
    ) -> Result<Vec<NormalizedItem>> {
        let feed = parser::parse(body.as_bytes())
            .map_err(|e| DigestError::Feed(format!("arXiv feed for {}: {}", category, e)))?;

        let mut papers = Vec::new();
        for entry in feed.entries.into_iter().take(self.config.max_papers) {
            let published = match entry.published {
                Some(at) => at,
                None => continue,
            };
            if !window.contains(published) {
                continue;
            }

            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_default()
                .trim()
                .to_string();
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_else(|| entry.id.clone());
            let summary = entry
                .summary
                .map(|s| truncate_chars(&s.content.replace('\n', " "), SUMMARY_MAX_CHARS))
                .unwrap_or_default();
            let authors: Vec<String> = entry
                .authors
                .into_iter()
                .take(MAX_AUTHORS)
                .map(|a| a.name)
                .collect();

            papers.push(NormalizedItem::Paper {
                meta: format!("arXiv • {}", authors.join(", ")),
                title,
                url,
                summary,
                authors,
                published_at: published,
                category: category.to_string(),
            });
        }

        Ok(papers)
    }
}

#[async_trait]
impl FetchSource for ArxivSource {
    fn source(&self) -> Source {
        Source::Arxiv
    }

    async fn fetch(&self, window: &CollectionWindow) -> Result<Vec<NormalizedItem>> {
        let mut papers = Vec::new();

        for category in &self.config.categories {
            debug!("Querying arXiv category {}", category);
            let body = self
                .client
                .get(self.query_url(category))
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;

            let mut found = self.parse_category_feed(category, &body, window)?;
            debug!("arXiv {}: {} recent papers", category, found.len());
            papers.append(&mut found);
        }

        info!("Found {} recent papers on arXiv", papers.len());
        Ok(papers)
    }
}
