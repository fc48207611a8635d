//! Recovery of structured data from a model reply.
//!
//! The curation prompt demands pure JSON, but replies routinely arrive
//! wrapped in markdown fences or padded with prose. Recovery is a strict
//! two-stage contract: first reclaim the JSON text (or fail with a snippet
//! of the offending reply), then decode it. Text cleanup succeeding never
//! implies the content is valid; that is the curator's validation step.

use crate::types::{DigestError, Result};

/// Known opening fence markers, longest first so one strip is enough.
const OPENING_FENCES: [&str; 4] = ["```json\n", "```json", "```\n", "```"];

/// Strip fence wrapping and verify the `{`..`}` envelope. Returns the
/// cleaned JSON text, or a parse failure carrying a snippet of what was
/// actually there.
pub fn recover_json(raw: &str) -> Result<String> {
    let mut text = raw.trim();

    for fence in OPENING_FENCES {
        if let Some(rest) = text.strip_prefix(fence) {
            text = rest;
            break;
        }
    }

    // Anything from a remaining fence onward is the model talking again.
    text = match text.find("\n```") {
        Some(idx) => &text[..idx],
        None => text.strip_suffix("```").unwrap_or(text),
    };
    text = text.trim();

    if !text.starts_with('{') {
        return Err(DigestError::LlmResponseParse {
            reason: "response does not start with '{'".to_string(),
            snippet: head(text, 100),
        });
    }
    if !text.ends_with('}') {
        return Err(DigestError::LlmResponseParse {
            reason: "response does not end with '}'".to_string(),
            snippet: tail(text, 100),
        });
    }

    Ok(text.to_string())
}

/// Recover then decode. A decode failure surfaces the underlying JSON
/// error together with a snippet of the raw reply.
pub fn parse_json(raw: &str) -> Result<serde_json::Value> {
    let cleaned = recover_json(raw)?;
    serde_json::from_str(&cleaned).map_err(|e| DigestError::LlmResponseParse {
        reason: format!("JSON decode failed: {}", e),
        snippet: head(raw, 200),
    })
}

fn head(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max_chars)).collect()
}
