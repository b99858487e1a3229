//! ShelfScout Recommendation Engine
//!
//! Loads a catalog and a user library from JSON fixtures, runs the
//! recommendation session against them and prints the first published set.
//!
//! # Graceful Shutdown
//!
//! Ctrl-C or SIGTERM before the first publication stops the session cleanly.

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shelfscout::{Catalog, Config, LibraryStore, RecommendationEngine, RecommendationSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with structured logging
    init_tracing();

    info!("═══════════════════════════════════════════════════════════════");
    info!("  📚 ShelfScout Recommendation Engine v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════════════════════════");

    // Load configuration
    let config = Config::from_env()?;
    info!("✅ Configuration loaded and validated");

    let catalog = Catalog::from_json_file(&config.fixtures.catalog_path)?;
    let library = LibraryStore::from_json_file(&config.fixtures.library_path)?;

    let engine = RecommendationEngine::new(config.recommendation.clone());
    let session = RecommendationSession::new(engine, Arc::new(catalog));
    let mut published = session.subscribe();

    // Create shutdown channel
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let handle = tokio::spawn(session.run(library.subscribe(), shutdown_tx.subscribe()));

    tokio::select! {
        changed = published.changed() => {
            changed?;
            let set = published.borrow_and_update().clone();
            info!("📤 {} recommendations (library hash: {})", set.len(), set.interaction_hash);
            println!("{}", serde_json::to_string_pretty(&*set)?);
        }
        _ = shutdown_signal() => {
            info!("📴 Shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(());
    match tokio::time::timeout(Duration::from_secs(5), handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Recommendation session task failed: {:?}", e),
        Err(_) => warn!("⚠️ Shutdown timeout exceeded, forcing exit"),
    }

    info!("👋 ShelfScout stopped gracefully");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shelfscout_engine=debug,shelfscout=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
