//! 设备配置 CRUD handlers
//!
//! - GET /configurations - 列出配置
//! - POST /configurations - 创建配置
//! - GET /configurations/{id} - 获取配置
//! - PUT /configurations/{id} - 更新配置（活动会话同步生效）
//! - DELETE /configurations/{id} - 删除配置（活动会话先断开）
//! - POST /configurations/{id}/publish - 写入云端

use crate::AppState;
use crate::utils::{
    not_found_error, ok, session_error, sync_error, validate_configuration,
};
use api_contract::ConfigurationRequest;
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct ConfigurationPath {
    id: String,
}

/// 列出配置
pub async fn list_configurations(State(state): State<AppState>) -> Response {
    match state.session.list_configurations().await {
        Ok(items) => ok(items),
        Err(err) => session_error(err),
    }
}

/// 创建配置
pub async fn create_configuration(
    State(state): State<AppState>,
    Json(req): Json<ConfigurationRequest>,
) -> Response {
    let id = req
        .id
        .clone()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let config = match validate_configuration(req.into_configuration(id)) {
        Ok(config) => config,
        Err(response) => return response,
    };
    match state.session.add_configuration(config).await {
        Ok(created) => ok(created),
        Err(err) => session_error(err),
    }
}

/// 获取配置
pub async fn get_configuration(
    State(state): State<AppState>,
    Path(path): Path<ConfigurationPath>,
) -> Response {
    match state.session.find_configuration(&path.id).await {
        Ok(Some(config)) => ok(config),
        Ok(None) => not_found_error(),
        Err(err) => session_error(err),
    }
}

/// 更新配置
pub async fn update_configuration(
    State(state): State<AppState>,
    Path(path): Path<ConfigurationPath>,
    Json(req): Json<ConfigurationRequest>,
) -> Response {
    let config = match validate_configuration(req.into_configuration(path.id)) {
        Ok(config) => config,
        Err(response) => return response,
    };
    match state.session.update_configuration(config).await {
        Ok(updated) => ok(updated),
        Err(err) => session_error(err),
    }
}

/// 删除配置
pub async fn delete_configuration(
    State(state): State<AppState>,
    Path(path): Path<ConfigurationPath>,
) -> Response {
    match state.session.remove_configuration(&path.id).await {
        Ok(true) => ok(serde_json::json!({ "id": path.id })),
        Ok(false) => not_found_error(),
        Err(err) => session_error(err),
    }
}

/// 把配置写入其同步提供方
pub async fn publish_configuration(
    State(state): State<AppState>,
    Path(path): Path<ConfigurationPath>,
) -> Response {
    let config = match state.session.find_configuration(&path.id).await {
        Ok(Some(config)) => config,
        Ok(None) => return not_found_error(),
        Err(err) => return session_error(err),
    };
    match state.session.sync().save_configuration(&config).await {
        Ok(()) => ok(config),
        Err(err) => sync_error(err),
    }
}
