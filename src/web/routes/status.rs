use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::web::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) async fn api_status(State(state): State<AppState>) -> Json<Value> {
    let binds: Vec<String> = state.bind_addrs.iter().map(|a| a.to_string()).collect();
    Json(json!({
        "version": VERSION,
        "bind_addrs": binds,
        "download_root": state.download_root().to_string_lossy(),
        "worker_running": state.worker.is_running(),
    }))
}
