use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::queue::manager::DEFAULT_HISTORY_LIMIT;
use crate::queue::models::Job;
use crate::web::error::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    pub(crate) limit: Option<u32>,
}

pub(crate) async fn get_history(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit == 0 {
        return Err(ApiError::bad_request("limit must be positive"));
    }
    Ok(Json(state.queue.list_history(limit).await?))
}

pub(crate) async fn clear_history(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.queue.clear_history().await?;
    Ok(Json(json!({ "ok": true, "removed": removed })))
}
