use axum::Json;
use axum::body::Body;
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::header;
use axum::response::Response;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::io::ReaderStream;

use crate::media::{access, library};
use crate::web::error::ApiError;
use crate::web::state::AppState;

/// 列出所有已下载影片。
pub(crate) async fn list_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<library::VideoFile>>, ApiError> {
    let root = state.download_root();
    let videos = tokio::task::spawn_blocking(move || library::list_videos(&root))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;
    Ok(Json(videos))
}

/// 串流影片文件。
pub(crate) async fn get_video(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    let root = state.download_root();
    let canon = access::open(&root, &filename)?;

    let mime = content_type_for(&canon);
    let file = tokio::fs::File::open(&canon)
        .await
        .map_err(|_| access::AccessError::NotFound)?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut resp = Response::new(body);
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(mime));
    if let Some(name) = canon.file_name().and_then(|s| s.to_str())
        && let Some(hv) = content_disposition(name)
    {
        resp.headers_mut().insert(header::CONTENT_DISPOSITION, hv);
    }
    Ok(resp)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RenameQuery {
    pub(crate) new_name: String,
}

/// 重命名影片文件，保留原扩展名。
pub(crate) async fn rename_video(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
    Query(q): Query<RenameQuery>,
) -> Result<Json<Value>, ApiError> {
    let root = state.download_root();
    let new_filename = access::rename(&root, &filename, &q.new_name)?;
    Ok(Json(json!({ "ok": true, "new_filename": new_filename })))
}

/// 删除影片文件（不可恢复）。
pub(crate) async fn delete_video(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Json<Value>, ApiError> {
    let root = state.download_root();
    access::delete(&root, &filename)?;
    Ok(Json(json!({ "ok": true })))
}

fn content_type_for(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

/// RFC 5987 filename* 编码，兼顾非 ASCII 文件名与老客户端的 ASCII 回退。
fn content_disposition(filename: &str) -> Option<header::HeaderValue> {
    fn is_unreserved(b: u8) -> bool {
        b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_')
    }

    let mut encoded = String::with_capacity(filename.len() * 3);
    for &b in filename.as_bytes() {
        if is_unreserved(b) {
            encoded.push(char::from(b));
        } else {
            encoded.push('%');
            encoded.push_str(&format!("{b:02X}"));
        }
    }

    let ascii_fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = format!("attachment; filename=\"{ascii_fallback}\"; filename*=UTF-8''{encoded}");
    header::HeaderValue::from_str(&value).ok()
}
