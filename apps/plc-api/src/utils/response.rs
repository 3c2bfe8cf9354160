//! HTTP 响应辅助函数
//!
//! 所有错误返回统一的 ApiResponse 格式，HTTP 状态码与错误码对应。

use api_contract::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use plc_session::SessionError;
use plc_storage::StorageError;
use plc_sync::SyncError;
use serde::Serialize;

/// 成功响应
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found")),
    )
        .into_response()
}

/// 存储错误响应（重复 id 返回 409）
pub fn storage_error(err: StorageError) -> Response {
    let message = err.to_string();
    if err.is_duplicate() {
        return (
            StatusCode::CONFLICT,
            Json(ApiResponse::<()>::error("RESOURCE.CONFLICT", message)),
        )
            .into_response();
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", message)),
    )
        .into_response()
}

/// 会话错误响应
pub fn session_error(err: SessionError) -> Response {
    let message = err.to_string();
    let (status, code) = match err {
        SessionError::Storage(err) => return storage_error(err),
        SessionError::NotFound(_) => return not_found_error(),
        SessionError::Busy(_) => (StatusCode::CONFLICT, "SESSION.BUSY"),
        SessionError::Cancelled => (StatusCode::CONFLICT, "SESSION.CANCELLED"),
        SessionError::Connection(_) => (StatusCode::BAD_GATEWAY, "SESSION.CONNECTION_FAILED"),
    };
    (status, Json(ApiResponse::<()>::error(code, message))).into_response()
}

/// 云同步错误响应
pub fn sync_error(err: SyncError) -> Response {
    let (status, code) = match &err {
        SyncError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SYNC.UNAVAILABLE"),
        SyncError::Delivery(_) | SyncError::Read(_) => (StatusCode::BAD_GATEWAY, "SYNC.FAILED"),
        SyncError::Payload(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL.ERROR"),
    };
    (
        status,
        Json(ApiResponse::<()>::error(code, err.to_string())),
    )
        .into_response()
}
