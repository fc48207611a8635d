use crate::types::{DigestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Full run configuration, loaded once from config.yaml and immutable for
/// the duration of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub sources: SourcesConfig,
    pub curation: CurationConfig,
    pub presentation: PresentationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub arxiv: ArxivConfig,
    pub hackernews: HackerNewsConfig,
    pub reddit: RedditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    pub enabled: bool,
    pub categories: Vec<String>,
    pub max_papers: usize,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            categories: vec![
                "cs.AI".to_string(),
                "cs.LG".to_string(),
                "cs.CL".to_string(),
                "cs.MA".to_string(),
            ],
            max_papers: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HackerNewsConfig {
    pub enabled: bool,
    pub keywords: Vec<String>,
    pub min_score: i64,
    pub max_items: usize,
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keywords: vec![
                "agent".to_string(),
                "agentic".to_string(),
                "llm".to_string(),
                "gpt".to_string(),
                "claude".to_string(),
                "autonomous".to_string(),
                "multi-agent".to_string(),
            ],
            min_score: 100,
            max_items: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub enabled: bool,
    pub subreddits: Vec<String>,
    pub min_score: i64,
    pub max_items: usize,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subreddits: vec![
                "MachineLearning".to_string(),
                "LocalLLaMA".to_string(),
                "artificial".to_string(),
            ],
            min_score: 50,
            max_items: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    pub model: String,
    pub focus_topics: Vec<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            focus_topics: vec![
                "autonomous agents".to_string(),
                "multi-agent systems".to_string(),
                "tool use".to_string(),
                "planning and reasoning".to_string(),
            ],
            // Generous output budget; truncated replies cannot be recovered
            // into valid JSON and fail the run.
            max_tokens: 16384,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    pub max_items: usize,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            sections: vec![
                SectionConfig {
                    name: "Key Research Papers".to_string(),
                    max_items: 5,
                },
                SectionConfig {
                    name: "Industry Updates".to_string(),
                    max_items: 5,
                },
                SectionConfig {
                    name: "Tools & Frameworks".to_string(),
                    max_items: 5,
                },
                SectionConfig {
                    name: "Notable Discussions".to_string(),
                    max_items: 5,
                },
            ],
        }
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            curation: CurationConfig::default(),
            presentation: PresentationConfig::default(),
        }
    }
}

impl DigestConfig {
    /// Load and validate configuration from a YAML file. Missing or
    /// malformed config aborts before any fetch or curation work begins.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DigestError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: DigestConfig = serde_yaml::from_str(&raw).map_err(|e| {
            DigestError::Config(format!("malformed config {}: {}", path.display(), e))
        })?;

        config.validate()?;
        info!(
            "Loaded config from {} ({} sections)",
            path.display(),
            config.presentation.sections.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.presentation.sections.is_empty() {
            return Err(DigestError::Config(
                "presentation.sections must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for section in &self.presentation.sections {
            if section.name.trim().is_empty() {
                return Err(DigestError::Config(
                    "section names must not be blank".to_string(),
                ));
            }
            if !seen.insert(section.name.as_str()) {
                return Err(DigestError::Config(format!(
                    "duplicate section name: {}",
                    section.name
                )));
            }
        }

        if self.curation.model.trim().is_empty() {
            return Err(DigestError::Config(
                "curation.model must be set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DigestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.presentation.sections.len(), 4);
    }

    #[test]
    fn parses_partial_yaml_with_defaults() {
        let yaml = r#"
sources:
  hackernews:
    min_score: 42
curation:
  model: claude-test
"#;
        let config: DigestConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sources.hackernews.min_score, 42);
        assert_eq!(config.curation.model, "claude-test");
        // Untouched sections fall back to defaults.
        assert!(config.sources.arxiv.enabled);
        assert_eq!(config.curation.max_tokens, 16384);
    }

    #[test]
    fn rejects_duplicate_sections() {
        let mut config = DigestConfig::default();
        config.presentation.sections.push(SectionConfig {
            name: "Industry Updates".to_string(),
            max_items: 3,
        });
        assert!(matches!(
            config.validate(),
            Err(DigestError::Config(_))
        ));
    }

    #[test]
    fn missing_config_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = DigestConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        match err {
            DigestError::Config(msg) => assert!(msg.contains("nope.yaml")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn malformed_yaml_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "sources: [not: a: mapping").unwrap();
        assert!(matches!(
            DigestConfig::load(&path),
            Err(DigestError::Config(_))
        ));
    }

    #[test]
    fn rejects_empty_sections() {
        let mut config = DigestConfig::default();
        config.presentation.sections.clear();
        assert!(config.validate().is_err());
    }
}
