pub mod collector;
pub mod config;
pub mod curator;
pub mod llm;
pub mod response;
pub mod sources;
pub mod store;
pub mod types;

pub use collector::Collector;
pub use config::DigestConfig;
pub use curator::Curator;
pub use llm::{AnthropicClient, CompletionRequest, LlmClient, MockLlmClient};
pub use sources::{ArxivSource, FetchSource, HackerNewsSource, RedditSource};
pub use store::DigestStore;
pub use types::*;
