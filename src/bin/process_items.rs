//! Seed an in-memory store, process every item once, print the batch summary.
//!
//! Usage: `process-items [COUNT]` (default 25). Settings come from
//! `ITEM_PROCESSOR__*` environment variables.

use std::sync::Arc;

use anyhow::Context;
use item_processor::logging::init_structured_logging;
use item_processor::{InMemoryItemStore, ProcessorConfig, ProcessorSystem};
use tracing::info;

const DEFAULT_ITEM_COUNT: usize = 25;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let count = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<usize>()
            .with_context(|| format!("invalid item count: {arg}"))?,
        None => DEFAULT_ITEM_COUNT,
    };

    let config = ProcessorConfig::from_env().context("failed to load configuration")?;
    let store = Arc::new(InMemoryItemStore::seeded(count));
    let system = ProcessorSystem::bootstrap(config, store).context("failed to bootstrap")?;

    info!(count = count, "Processing seeded items");
    let outcome = system
        .service()
        .process_items()
        .await
        .context("batch did not complete")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&outcome.result().summary())?
    );

    let report = system.shutdown().await;
    info!(drained = report.drained, "Done");

    Ok(())
}
