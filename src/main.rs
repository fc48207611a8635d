use ai_digest::{
    AnthropicClient, Collector, Curator, DigestConfig, DigestStore, LlmClient,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "ai-digest", about = "Weekly AI digest collection and curation")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Directory holding snapshot and digest artifacts.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect items from all enabled sources into a raw snapshot.
    Collect,
    /// Curate the most recent raw snapshot into a digest.
    Curate,
    /// Collect, then curate.
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Missing or malformed configuration aborts before any fetch or
    // curation work begins.
    let config = DigestConfig::load(&cli.config)?;

    let store = Arc::new(DigestStore::new(&cli.data_dir)?);

    match cli.command {
        Command::Collect => {
            collect(&config, store).await?;
        }
        Command::Curate => {
            curate(&config, store).await?;
        }
        Command::Run => {
            collect(&config, Arc::clone(&store)).await?;
            curate(&config, store).await?;
        }
    }

    Ok(())
}

async fn collect(config: &DigestConfig, store: Arc<DigestStore>) -> anyhow::Result<()> {
    let collector = Collector::from_config(&config.sources, store);
    let snapshot = collector.collect_all().await?;
    info!(
        "Collected {} papers, {} stories, {} discussions",
        snapshot.papers.len(),
        snapshot.stories.len(),
        snapshot.discussions.len()
    );
    Ok(())
}

async fn curate(config: &DigestConfig, store: Arc<DigestStore>) -> anyhow::Result<()> {
    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .context("ANTHROPIC_API_KEY must be set for curation")?;
    let llm: Arc<dyn LlmClient> = Arc::new(AnthropicClient::new(
        api_key,
        config.curation.model.clone(),
    ));

    let curator = Curator::new(store, llm, config.clone());
    let digest = curator.curate().await?;
    info!("Curated digest with {} items", digest.item_count());
    Ok(())
}
