//! One-night werewolf game session server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin jinro-server
//! cargo run --bin jinro-server -- --port 3000 --store-path ./jinro.json
//! ```

use std::sync::Arc;

use clap::Parser;
use jinro_server::{
    config::ServerConfig,
    domain::{GameStore, Notifier},
    infrastructure::{
        notifier::{HttpNotifier, LogNotifier},
        store::{FileGameStore, InMemoryGameStore},
    },
    ui::Server,
    usecase::GameService,
};
use jinro_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    let settings = match config.game_settings() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    // 1. GameStore
    let store: Arc<dyn GameStore> = match &config.store_path {
        Some(path) => match FileGameStore::open(path).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("Failed to open game store {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("No store path given, game records are kept in memory");
            Arc::new(InMemoryGameStore::new())
        }
    };

    // 2. Notifier
    let notifier: Arc<dyn Notifier> = match &config.push_endpoint {
        Some(endpoint) => {
            tracing::info!("Pushing notices to {}", endpoint);
            Arc::new(HttpNotifier::new(endpoint.clone()))
        }
        None => {
            tracing::info!("No push endpoint given, notices are only logged");
            Arc::new(LogNotifier)
        }
    };

    // 3. GameService
    let service = GameService::new(settings, store, notifier, Arc::new(SystemClock));

    // 4. Server
    let server = Server::new(service);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
