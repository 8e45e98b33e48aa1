use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use linehaul_server::config::ServerConfig;
use linehaul_server::store::{MemoryStore, SnapshotFile};
use linehaul_server::web::{AppState, create_router};

const DEFAULT_LOG_FILTER: &str = "linehaul_server=info,tower_http=info";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = ServerConfig::from_env().expect("Invalid configuration");

    let store = match &config.seed {
        Some(path) => {
            let file = SnapshotFile::new(path);
            let snapshot = file.load().expect("Failed to load seed snapshot");
            let store = MemoryStore::from_snapshot(snapshot).expect("Invalid seed snapshot");
            info!(path = %file.path().display(), "store seeded");
            store
        }
        None => {
            warn!("LINEHAUL_SEED not set, starting with an empty store");
            MemoryStore::new()
        }
    };

    let state = AppState::new(
        Arc::new(store),
        config.coordinator.clone(),
        &config.mileage_cache,
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("Failed to bind");
    info!(addr = %config.bind, "linehaul server listening");
    axum::serve(listener, app).await.expect("Server error");
}
