//! worker 启停控制。

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::web::error::ApiError;
use crate::web::state::AppState;

pub(crate) async fn start_download(State(state): State<AppState>) -> Json<Value> {
    state.worker.start();
    Json(json!({ "ok": true, "running": true }))
}

pub(crate) async fn stop_download(State(state): State<AppState>) -> Json<Value> {
    state.worker.stop();
    Json(json!({ "ok": true, "running": false }))
}

pub(crate) async fn download_status(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let active = state.queue.list_active().await?;
    Ok(Json(json!({
        "running": state.worker.is_running(),
        "active_jobs": active.len(),
    })))
}
