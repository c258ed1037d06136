use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
}

async fn root(State(state): State<AppState>) -> String {
    format!("{} signal watch is running", state.symbol)
}

/// Liveness probe for hosting platforms and ops scripts.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "symbol": state.symbol,
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}
