mod cli;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use episodic::config::EngineConfig;
use episodic::sources::{Source, SourceRegistry};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn lookup(registry: &SourceRegistry, name: &str) -> Result<Arc<dyn Source>> {
    registry
        .get(name)
        .ok_or_else(|| anyhow!("unknown source '{}' (available: {})", name, registry.names().join(", ")))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("episodic=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = EngineConfig::load(cli.config.as_deref())?;
    let registry = SourceRegistry::with_defaults(&cfg)?;

    match cli.command {
        Commands::Sources => {
            let caps: Vec<_> = registry
                .capabilities()
                .into_iter()
                .map(|(name, caps)| serde_json::json!({ "name": name, "capabilities": caps }))
                .collect();
            print_json(&caps)?;
        }
        Commands::Catalog { source, page, category, year } => {
            let source = lookup(&registry, &source)?;
            let items = source.scrape_catalog(page, category.as_deref(), year.as_deref()).await;
            print_json(&items)?;
        }
        Commands::Detail { source, id } => {
            let bundle = lookup(&registry, &source)?.scrape_detail(&id).await;
            print_json(&bundle)?;
        }
        Commands::Video { source, play_url } => {
            match lookup(&registry, &source)?.scrape_video(&play_url).await {
                Some(video) => print_json(&video)?,
                None => bail!("no playable stream found at {}", play_url),
            }
        }
        Commands::Home { source } => {
            let source = lookup(&registry, &source)?;
            if !source.capabilities().home {
                bail!("source '{}' has no home page", source.name());
            }
            print_json(&source.scrape_home().await)?;
        }
        Commands::Filters { source } => {
            let source = lookup(&registry, &source)?;
            print_json(&serde_json::json!({
                "categories": source.categories(),
                "years": source.years(),
            }))?;
        }
    }
    Ok(())
}
