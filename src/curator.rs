use crate::config::DigestConfig;
use crate::llm::{CompletionRequest, LlmClient};
use crate::response;
use crate::store::DigestStore;
use crate::types::{
    CuratedDigest, CuratedItem, DigestSection, NormalizedItem, RawSnapshot, Result, Source,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

const PROMPT_SUMMARY_MAX_CHARS: usize = 200;
const FALLBACK_SUMMARY: &str = "No summary available for this week.";

/// One snapshot item reduced to what the model needs to judge it.
#[derive(Debug, Serialize)]
struct PromptItem<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    url: &'a str,
    meta: &'a str,
}

/// Decoded reply before validation; deliberately loose so the strictness
/// lives in `normalize`, not in serde.
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    sections: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    weekly_summary: Option<String>,
}

/// Transforms the latest raw snapshot into a curated digest through a
/// single LLM call, then validates and persists the result.
pub struct Curator {
    store: Arc<DigestStore>,
    llm: Arc<dyn LlmClient>,
    config: DigestConfig,
}

impl Curator {
    pub fn new(store: Arc<DigestStore>, llm: Arc<dyn LlmClient>, config: DigestConfig) -> Self {
        Self { store, llm, config }
    }

    /// Full curation run: load, prompt, invoke, recover, validate,
    /// persist. Either fully succeeds or fails the run; no partial digest
    /// is ever written.
    pub async fn curate(&self) -> Result<CuratedDigest> {
        let snapshot = self.store.load_latest_snapshot()?;
        info!(
            "Curating snapshot of {} items collected at {}",
            snapshot.item_count(),
            snapshot.collected_at
        );

        let prompt = self.build_prompt(&snapshot)?;
        info!(
            "Sending {} items to the {} backend",
            snapshot.item_count(),
            self.llm.name()
        );
        let reply = self
            .llm
            .complete(CompletionRequest {
                prompt,
                max_tokens: self.config.curation.max_tokens,
                temperature: self.config.curation.temperature,
            })
            .await?;

        let value = match response::parse_json(&reply) {
            Ok(value) => value,
            Err(e) => {
                // Surface the whole reply so an operator can see what the
                // model actually sent.
                error!("Unrecoverable LLM response: {}", reply);
                return Err(e);
            }
        };

        let digest = self.normalize(value);

        self.store
            .save_digest(&digest, Utc::now().date_naive())?;
        info!("Weekly theme: {}", digest.weekly_summary);
        for section in &digest.sections {
            info!("  {}: {} items", section.name, section.items.len());
        }

        Ok(digest)
    }

    /// Flatten the snapshot into tagged prompt items and render the
    /// instruction prompt with its strict JSON-only output contract.
    fn build_prompt(&self, snapshot: &RawSnapshot) -> Result<String> {
        let items: Vec<PromptItem<'_>> = snapshot.all_items().map(prompt_item).collect();
        let items_json = serde_json::to_string_pretty(&items)?;

        let focus = self.config.curation.focus_topics.join(", ");
        let section_lines: String = self
            .config
            .presentation
            .sections
            .iter()
            .map(|s| format!("   - {}\n", s.name))
            .collect();
        let section_limits: String = self
            .config
            .presentation
            .sections
            .iter()
            .map(|s| format!("{}: {}", s.name, s.max_items))
            .collect::<Vec<_>>()
            .join(", ");
        let structure_sections: String = self
            .config
            .presentation
            .sections
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if i == 0 {
                    format!(
                        "    \"{}\": [\n      {{\"title\": \"...\", \"url\": \"...\", \"meta\": \"...\", \"insight\": \"...\", \"score\": 9}}\n    ]",
                        s.name
                    )
                } else {
                    format!("    \"{}\": []", s.name)
                }
            })
            .collect::<Vec<_>>()
            .join(",\n");

        Ok(format!(
            r#"Curate a weekly digest on agentic AI - autonomous agents, multi-agent systems, tool use, planning, reasoning.

Focus topics: {focus}

{count} items from this week. Tasks:

1. Filter the most relevant items about agentic AI and agent capabilities
2. Categorize into sections:
{section_lines}
3. For each item provide:
   - Section assignment
   - One-sentence insight (what makes it important/interesting)
   - Relevance score (1-10)

4. Select TOP items per section: {section_limits}

Items:

{items_json}

CRITICAL: Return ONLY valid JSON. No markdown, no code blocks, no explanatory text. Start with {{ and end with }}.

Structure:
{{
  "sections": {{
{structure_sections}
  }},
  "weekly_summary": "2-3 sentence summary of week's major themes"
}}"#,
            count = items.len(),
        ))
    }

    /// Validate the decoded reply against the digest shape.
    ///
    /// Sections come out in configured order; unknown sections are
    /// dropped, as are items with out-of-range scores, items repeating a
    /// URL already placed in an earlier section, and items beyond a
    /// section's configured maximum.
    fn normalize(&self, value: serde_json::Value) -> CuratedDigest {
        let reply: RawReply = match serde_json::from_value(value) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Reply shape did not match the digest contract: {}", e);
                RawReply {
                    sections: serde_json::Map::new(),
                    weekly_summary: None,
                }
            }
        };

        for name in reply.sections.keys() {
            if !self
                .config
                .presentation
                .sections
                .iter()
                .any(|s| s.name == *name)
            {
                warn!("Dropping unknown section from reply: {}", name);
            }
        }

        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut sections = Vec::with_capacity(self.config.presentation.sections.len());

        for section_config in &self.config.presentation.sections {
            let raw_items = reply
                .sections
                .get(&section_config.name)
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();

            let mut items: Vec<CuratedItem> = Vec::new();
            for raw in raw_items {
                if items.len() >= section_config.max_items {
                    warn!(
                        "Section {} exceeded its limit of {}; dropping the rest",
                        section_config.name, section_config.max_items
                    );
                    break;
                }

                let item: CuratedItem = match serde_json::from_value(raw) {
                    Ok(item) => item,
                    Err(e) => {
                        warn!(
                            "Dropping malformed item in {}: {}",
                            section_config.name, e
                        );
                        continue;
                    }
                };

                if !(1..=10).contains(&item.score) {
                    warn!(
                        "Dropping '{}' with out-of-range score {}",
                        item.title, item.score
                    );
                    continue;
                }

                if !seen_urls.insert(item.url.clone()) {
                    warn!(
                        "Dropping '{}' duplicated across sections ({})",
                        item.title, item.url
                    );
                    continue;
                }

                items.push(item);
            }

            sections.push(DigestSection {
                name: section_config.name.clone(),
                items,
            });
        }

        let weekly_summary = reply
            .weekly_summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_SUMMARY.to_string());

        CuratedDigest {
            sections,
            weekly_summary,
        }
    }
}

fn prompt_item(item: &NormalizedItem) -> PromptItem<'_> {
    let kind = match item.source() {
        Source::Arxiv => "paper",
        Source::HackerNews => "news",
        Source::Reddit => "discussion",
    };

    PromptItem {
        kind,
        title: item.title(),
        summary: item
            .summary()
            .map(|s| crate::sources::truncate_chars(s, PROMPT_SUMMARY_MAX_CHARS)),
        url: item.url(),
        meta: item.meta(),
    }
}
