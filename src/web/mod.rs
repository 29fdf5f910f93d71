//! HTTP surface: the dashboard page, its JSON view and the CSV download.
pub mod handlers;
pub mod page;

use crate::core::dealers::DealerDirectory;
use crate::core::{DashboardEngine, Pipeline};
use crate::utils::error::Result;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct AppState<P: Pipeline> {
    pub engine: Arc<DashboardEngine<P>>,
    pub dealers: Arc<DealerDirectory>,
}

impl<P: Pipeline> AppState<P> {
    pub fn new(engine: DashboardEngine<P>, dealers: Arc<DealerDirectory>) -> Self {
        Self {
            engine: Arc::new(engine),
            dealers,
        }
    }
}

// derive(Clone) would require P: Clone
impl<P: Pipeline> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            dealers: Arc::clone(&self.dealers),
        }
    }
}

pub fn router<P: Pipeline + 'static>(state: AppState<P>) -> Router {
    Router::new()
        .route("/", get(handlers::index::<P>))
        .route("/api/dashboard", get(handlers::dashboard_json::<P>))
        .route("/api/mobis-codes", get(handlers::mobis_codes::<P>))
        .route("/export.csv", get(handlers::export_csv::<P>))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serves until the process is stopped.
pub async fn serve<P: Pipeline + 'static>(listener: TcpListener, state: AppState<P>) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("🚀 Dashboard listening on http://{}", addr);
    }
    axum::serve(listener, router(state)).await?;
    Ok(())
}
