use anyhow::Result;
use feasthub::config::AppConfig;
use feasthub::orders::Reconciler;
use feasthub::server::ServerBuilder;
use feasthub::storage::Storage;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_new(&config.log.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    tracing::info!(backend = ?config.storage.backend, "starting feasthub");
    let storage = Storage::from_config(&config.storage).await?;

    if let Some(secs) = config.orders.reconcile_interval_secs.filter(|s| *s > 0) {
        tracing::info!(interval_secs = secs, "periodic stats reconciliation enabled");
        Reconciler::new(storage.clone()).spawn_periodic(Duration::from_secs(secs));
    }

    let addr = config.server.addr();
    ServerBuilder::new()
        .with_config(config)
        .with_storage(storage)
        .serve(&addr)
        .await
}
