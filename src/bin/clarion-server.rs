//! Clarion HTTP server binary

use clarion::config::EngineConfig;
use clarion::store::{self, ConsentStore, PreferenceStore};
use clarion::{IntentEngine, MetricsRegistry, RateLimiter};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = EngineConfig::from_env();

    println!("Clarion Intent Resolution Engine");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("✓ Database: {}", config.db_path.display());
    println!("✓ Rate limit: {} req/s per client", config.rate_limit);

    let pool = store::connect(&config.db_path).await?;
    let prefs = PreferenceStore::new(pool.clone());
    let consent = ConsentStore::new(pool);
    let limiter = RateLimiter::new(config.rate_limit);
    let metrics = Arc::new(MetricsRegistry::new());

    let engine = IntentEngine::new(prefs, consent, limiter, metrics);

    println!("✓ Intent engine initialized");
    println!("✓ Starting HTTP server on port {}...", config.port);
    println!();

    clarion::server::run_server(engine, &config.salt, config.port).await?;

    Ok(())
}
