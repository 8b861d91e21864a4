

use std::io::Read;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use conceptmap::{create_extractor, ConceptMapConfig, GraphKind, Strategy};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the graph, logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("conceptmap=info".parse()?))
        .init();

    let mut args = std::env::args().skip(1);
    let strategy = match args.next() {
        Some(raw) => Strategy::from_str(&raw)
            .map_err(|_| anyhow!("unknown strategy '{raw}' (rake, linguistic, semantic, llm)"))?,
        None => Strategy::Rake,
    };
    let variant = args
        .next()
        .map(|raw| {
            GraphKind::from_str(&raw).map_err(|_| anyhow!("unknown graph variant '{raw}'"))
        })
        .transpose()?;

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("failed to read text from stdin")?;

    let config = ConceptMapConfig::from_env()?;
    let extractor = create_extractor(strategy, &config)?;
    let graph = extractor.extract(&text, variant).await?;

    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}
