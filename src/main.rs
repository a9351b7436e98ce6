//! SmartCache keyspace inspector
//!
//! Connects to the configured store, walks its keyspace, and logs the type,
//! TTL and size of every key.

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smartcache::{Cache, CacheError, Config, KeyType};

/// Main entry point for the inspector.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to the store
/// 4. Report every key until the scan ends or Ctrl+C arrives
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: store={}, default_ttl={}s",
        config.redis_url(),
        config.default_ttl
    );

    let cache = Cache::connect(&config)
        .await
        .with_context(|| format!("connecting to {}", config.redis_url()))?;
    info!("Connected to {}", cache.store().name());

    tokio::select! {
        result = report(&cache) => {
            let total = result?;
            info!("Scan complete: {} keys", total);
        }
        _ = signal::ctrl_c() => {
            warn!("Received Ctrl+C, stopping scan");
        }
    }

    Ok(())
}

/// Logs one line per key and returns the number of keys seen.
async fn report(cache: &Cache) -> anyhow::Result<usize> {
    let mut scan = cache.scan_db();
    let mut total = 0;

    while let Some(batch) = scan.next_batch().await? {
        for key in batch {
            let kind = cache.key_type(&key).await?;
            // Expired between scan and lookup
            if kind == KeyType::None {
                continue;
            }
            let ttl = cache.ttl(&key).await?;
            let size = match cache.size(&key).await {
                Ok(size) => size,
                // Scalars have no element count; report the byte length
                Err(CacheError::TypeMismatch(_)) => cache
                    .call("STRLEN", [key.as_str()])
                    .await?
                    .as_int()
                    .unwrap_or(0) as u64,
                Err(err) => {
                    warn!("Could not size {}: {}", key, err);
                    0
                }
            };
            info!("{} type={} ttl={} size={}", key, kind, ttl, size);
            total += 1;
        }
    }

    Ok(total)
}
