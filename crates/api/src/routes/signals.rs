use axum::{extract::State, routing::get, Json, Router};

use common::Signal;

use crate::AppState;

pub fn signals_router() -> Router<AppState> {
    Router::new().route("/signals", get(list_signals))
}

/// Persisted signals, oldest first. An unreadable store lists as empty.
async fn list_signals(State(state): State<AppState>) -> Json<Vec<Signal>> {
    Json(state.store.load_or_empty().await)
}
