//! Server startup and lifecycle.

use std::net::SocketAddr;

use ranko_core::Engine;
use tokio::net::TcpListener;
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

/// Spins up the engine, binds the listener, and serves until a
/// shutdown signal arrives.
pub async fn run(addr: SocketAddr, shard_count: usize) -> std::io::Result<()> {
    let engine = Engine::new(shard_count);
    let app = build_router(AppState::new(engine));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, shards = shard_count, "ranko server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("ranko server stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM. In-flight requests drain before the
/// serve future completes.
async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("failed to install Ctrl+C handler");
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        info!("received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
