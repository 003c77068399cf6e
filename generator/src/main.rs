use std::sync::Arc;

use gan::{SyntheticGenerator, GENERATOR_WEIGHTS_PATH};
use persistence_loop::{run_persistence_loop, LoopConfig};
use relief_data::{RecordStore, SqliteDocumentStore, DEFAULT_STORE_PATH};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod persistence_loop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // The loop retries until the store comes up, so connecting here must not fail.
    let store: Arc<dyn RecordStore> = Arc::new(SqliteDocumentStore::connect_lazy(DEFAULT_STORE_PATH));
    let generator = SyntheticGenerator::load_or_init(GENERATOR_WEIGHTS_PATH);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, stopping after the current tick");
        }
        let _ = stop_tx.send(true);
    });

    info!(store = DEFAULT_STORE_PATH, "starting data generation");
    let stats = tokio::spawn(run_persistence_loop(generator, store, LoopConfig::default(), stop_rx)).await?;
    info!(ticks = stats.ticks, written = stats.written, skipped = stats.skipped, failures = stats.failures, "generator stopped");
    Ok(())
}
