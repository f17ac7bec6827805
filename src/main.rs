//! KVStor server entry point.
//!
//! Sets up logging, the storage engine and its expiry sweeper, then accepts
//! connections until Ctrl+C.

use clap::Parser;
use kvstor::commands::CommandHandler;
use kvstor::config::Config;
use kvstor::connection::{handle_connection, ConnectionStats};
use kvstor::protocol::ResponseStyle;
use kvstor::storage::{ExpirySweeper, StorageEngine};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("KVStor v{}", kvstor::VERSION);
    info!(?config, "Configuration loaded");

    // Shared across all connections and the sweeper
    let storage = Arc::new(StorageEngine::new());

    let sweeper = ExpirySweeper::start(Arc::clone(&storage), config.expiry());

    let stats = Arc::new(ConnectionStats::new());

    // The only fatal error: the port cannot be bound
    let listener = TcpListener::bind(config.bind_address())
        .await
        .map_err(|e| anyhow::anyhow!("could not listen on {}: {e}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    let handler = CommandHandler::with_default_ttl(Arc::clone(&storage), config.default_ttl_secs);

    tokio::select! {
        _ = accept_loop(listener, handler, config.response_style(), Arc::clone(&stats)) => {}
        _ = shutdown => {}
    }

    sweeper.shutdown().await;

    let store_stats = storage.stats();
    info!(
        keys = store_stats.keys,
        gets = store_stats.get_ops,
        sets = store_stats.set_ops,
        deletes = store_stats.del_ops,
        expired = store_stats.expired,
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    handler: CommandHandler,
    style: ResponseStyle,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = handler.clone();
                let stats = Arc::clone(&stats);

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, style, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
