//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers：
//! - 健康检查：/health, /metrics
//! - 设备配置：/configurations/*
//! - 会话：/session/*
//! - 云同步：/sync/*

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .route(
            "/configurations",
            get(list_configurations).post(create_configuration),
        )
        .route(
            "/configurations/:id",
            get(get_configuration)
                .put(update_configuration)
                .delete(delete_configuration),
        )
        .route("/configurations/:id/publish", post(publish_configuration))
        .route("/session", get(get_session))
        .route("/session/connect", post(connect))
        .route("/session/disconnect", post(disconnect))
        .route("/session/samples", get(list_samples))
        .route("/session/samples.csv", get(export_samples))
        .route("/sync/status", get(get_sync_status))
        .route("/sync/test", post(test_sync))
}
