mod protocol;
mod tools;

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use model_intel_core::api::{LearnClient, RetailPricesClient};
use model_intel_core::cache::{self, CachedDocuments, CachedPricing, DiskCache};
use model_intel_core::Config;

use crate::tools::ToolServer;

/// Stdio tool server: one JSON-RPC message per line in, one per line out.
/// Logs go to stderr.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::load()?;
    let dir = cache::cache_dir().unwrap_or_else(|| std::env::temp_dir().join("model-intel"));
    let disk = DiskCache::new(dir, Duration::from_secs(config.cache_ttl_secs));
    let server = ToolServer::new(
        CachedDocuments::new(LearnClient::from_config(&config)?, disk.clone()),
        CachedPricing::new(RetailPricesClient::from_config(&config)?, disk),
        config,
    );
    tracing::info!("model-intel tool server listening on stdio");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(reply) = server.handle_line(line).await {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
