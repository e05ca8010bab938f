//! zkrelay HTTP server.
//!
//! Binds the relay router over production backends: the remote attestor
//! adapter and the file-backed proof cache.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use zkrelay::cache::FileStore;
use zkrelay::config::RelayConfig;
use zkrelay::prover::ZkFetchClient;
use zkrelay::rpc::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = RelayConfig::from_env();

    let provider = ZkFetchClient::new(
        config.attestor_url.clone(),
        config.app_id.clone(),
        config.app_secret.clone(),
        config.http_timeout_ms,
    )?;
    let store = FileStore::new(&config.cache_dir)?;

    let addr: SocketAddr = config.bind.parse()?;
    let state = Arc::new(AppState::new(config, Arc::new(provider), Box::new(store))?);
    let app = router(state);

    info!("Starting zkrelay v{} on {}", zkrelay::VERSION, addr);
    info!("API endpoints:");
    info!("  GET  /                        - Recent trades view");
    info!("  POST /generateUSDMTradeProof  - Prove a trade belongs to the caller");
    info!("  POST /generateAssetProof      - Prove an asset balance");
    info!("  POST /debugproxy              - Prove visible IP (connectivity check)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
