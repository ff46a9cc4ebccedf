//! 领域错误到 HTTP 状态码的映射。
//!
//! 四类错误原样透传给调用方：NotFound 404、InvalidArgument 400、
//! Conflict 409、AccessDenied 403。存储/IO 故障不归类，记日志后按 500 返回。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::media::access::AccessError;
use crate::queue::manager::QueueError;

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn internal(err: impl std::fmt::Display) -> Self {
        error!(target: "web", error = %err, "internal error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.message }))).into_response()
    }
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                message: "download not found".to_string(),
            },
            QueueError::Storage(e) => Self::internal(e),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        let status = match &err {
            AccessError::NotFound => StatusCode::NOT_FOUND,
            AccessError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AccessError::Conflict => StatusCode::CONFLICT,
            AccessError::AccessDenied => StatusCode::FORBIDDEN,
            AccessError::Io(e) => return Self::internal(e),
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}
