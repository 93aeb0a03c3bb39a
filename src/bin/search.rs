//! One-shot search from the command line.
//!
//! Usage: `scour-search [--config PATH] <term...>`
//!
//! Prints every outbound message as a JSON line on stdout and exits once
//! all sources have finished. Diagnostics go to stderr.

use scour::sink::JsonLinesSink;
use scour::{FileCatalog, ScourConfig};
use scour_search::{SearchOrchestrator, SessionId};
use std::path::PathBuf;
use std::sync::Arc;

struct Args {
    config: Option<PathBuf>,
    term: String,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut config = None;
    let mut words = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let Some(path) = args.next() else {
                anyhow::bail!("--config requires a path");
            };
            config = Some(PathBuf::from(path));
        } else {
            words.push(arg);
        }
    }
    if words.is_empty() {
        anyhow::bail!("usage: scour-search [--config PATH] <term...>");
    }
    Ok(Args {
        config,
        term: words.join(" "),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let config = ScourConfig::load(args.config.as_deref())?;
    scour::init_tracing(&config.logging.filter);

    let catalog = Arc::new(FileCatalog::new(&config.catalog.path));
    let orchestrator =
        SearchOrchestrator::new(catalog, config.fetch.clone(), config.orchestrator.clone())?;

    let sink = Arc::new(JsonLinesSink::new(tokio::io::stdout()));
    let handle = orchestrator
        .start_search(&args.term, SessionId::new("cli"), sink.clone())
        .await;

    let states = handle.wait().await;
    for (source, state) in &states {
        tracing::info!(%source, %state, "source finished");
    }
    sink.flush().await?;
    Ok(())
}
