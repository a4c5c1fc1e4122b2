use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "initialized": state.pipeline.is_ready(),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.uptime_secs()
    }))
}
