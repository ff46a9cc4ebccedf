use axum::Router;
use axum::extract::connect_info::ConnectInfo;
use axum::http::Request;
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use axum::routing::{delete, get, post, put};

use tracing::info;

use super::routes;
use super::state::AppState;

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(routes::status::api_status))
        .route(
            "/api/queue",
            post(routes::queue::add_to_queue).get(routes::queue::get_queue),
        )
        .route("/api/queue/:id", delete(routes::queue::remove_from_queue))
        .route("/api/queue/:id/retry", post(routes::queue::retry_download))
        .route(
            "/api/history",
            get(routes::history::get_history).delete(routes::history::clear_history),
        )
        .route(
            "/api/settings",
            get(routes::settings::get_settings).put(routes::settings::update_settings),
        )
        .route("/api/videos", get(routes::videos::list_videos))
        .route(
            "/api/videos/:filename",
            get(routes::videos::get_video).delete(routes::videos::delete_video),
        )
        .route(
            "/api/videos/:filename/rename",
            put(routes::videos::rename_video),
        )
        .route("/api/download/start", post(routes::worker::start_download))
        .route("/api/download/stop", post(routes::worker::stop_download))
        .route("/api/download/status", get(routes::worker::download_status))
        .layer(from_fn(access_log_mw))
        .with_state(state)
}

async fn access_log_mw(req: Request<axum::body::Body>, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let method = req.method().to_string();
    let ip = req
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|c| c.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let resp = next.run(req).await;
    info!(target: "web_access", ip = %ip, method = %method, path = %path, status = %resp.status().as_u16(), "ok");
    resp
}
