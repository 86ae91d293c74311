//! HTTP front door for triggering harvests.
//!
//! Thin layer over [`Harvester`]: request bodies get defaults applied, the
//! harvest runs to completion, and a JSON summary is returned. Harvest-level
//! failures (every source down, store rejections) still answer 200 with an
//! `errors` array; only malformed input is rejected.

mod handlers;
mod routes;

pub use handlers::{HarvestSummary, ParseBody, SourceSummary};
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::harvest::Harvester;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub harvester: Arc<Harvester>,
    /// Parent of every per-request cancellation token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(harvester: Arc<Harvester>) -> Self {
        Self {
            harvester,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Start the web server. Ctrl-C stops accepting connections and cancels
/// in-flight harvests, which then answer with their partial results.
pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    let addr: SocketAddr = addr.parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutting down, cancelling running harvests");
            }
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
