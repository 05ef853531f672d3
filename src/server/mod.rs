//! Read API over the stored rankings.
//!
//! JSON endpoints for listing sites and reading ranking snapshots, with
//! per-request fallback to the latest date that has data.

mod error;
mod handlers;
mod routes;

pub use error::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;

use crate::repository::Store;
use crate::services::RankingService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub rankings: RankingService,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            rankings: RankingService::new(store),
        }
    }
}

/// Start the web server.
pub async fn serve(store: Store, bind: &str) -> anyhow::Result<()> {
    let app = create_router(AppState::new(store));

    let addr: SocketAddr = bind.parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
