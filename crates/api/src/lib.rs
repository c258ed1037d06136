pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use common::SignalStore;

/// Shared application state injected into every route handler.
///
/// The store is only read here; the orchestrator is its single writer.
#[derive(Clone)]
pub struct AppState {
    pub symbol: String,
    pub store: Arc<dyn SignalStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(symbol: impl Into<String>, store: Arc<dyn SignalStore>) -> Self {
        Self {
            symbol: symbol.into(),
            store,
            started_at: Instant::now(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_router())
        .merge(routes::signals_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Build and run the status server. Bind or serve failures are logged and
/// end the task without affecting the signal loop.
pub async fn serve(state: AppState, port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "Status server failed to bind");
            return;
        }
    };

    info!(%addr, "Status server listening");
    if let Err(e) = axum::serve(listener, app(state)).await {
        error!(error = %e, "Status server stopped");
    }
}
