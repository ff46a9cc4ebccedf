use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::queue::models::Job;
use crate::web::error::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct UrlInput {
    pub(crate) urls: Vec<String>,
}

/// 新增网址到下载队列；已有活跃任务的 URL 静默跳过。
pub(crate) async fn add_to_queue(
    State(state): State<AppState>,
    Json(input): Json<UrlInput>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let added = state.queue.enqueue(&input.urls).await?;
    // 入队后叫醒 worker，不用等轮询间隔
    if !added.is_empty() {
        state.worker.poke();
    }
    Ok(Json(added))
}

pub(crate) async fn get_queue(
    State(state): State<AppState>,
) -> Result<Json<Vec<Job>>, ApiError> {
    Ok(Json(state.queue.list_active().await?))
}

pub(crate) async fn remove_from_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.queue.remove(&id).await?;
    Ok(Json(json!({ "ok": true })))
}

pub(crate) async fn retry_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    let job = state.queue.retry(&id).await?;
    state.worker.poke();
    Ok(Json(job))
}
