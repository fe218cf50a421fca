use std::net::SocketAddr;

use openplay::RotationManager;
use openplay::server::{AppState, build_router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let manager = match std::env::var("OPENPLAY_DB") {
        Ok(path) => {
            tracing::info!(path = %path, "using sqlite persistence");
            RotationManager::with_db(&path).expect("open rotation database")
        }
        Err(_) => RotationManager::new(),
    };

    let app = build_router(AppState { manager });

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "open play rotation server listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
