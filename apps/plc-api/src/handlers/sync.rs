//! 云同步 handlers
//!
//! - GET /sync/status - 当前同步状态与各提供方是否已配置
//! - POST /sync/test - 测试提供方连接（结果同时走通知通道）

use crate::AppState;
use crate::utils::{ok, sync_error};
use api_contract::{ProviderStatusDto, SyncStatusDto, SyncTestRequest};
use axum::{Json, extract::State, response::Response};
use domain::SyncProvider;

pub async fn get_sync_status(State(state): State<AppState>) -> Response {
    let sync = state.session.sync();
    let providers = SyncProvider::ALL
        .iter()
        .map(|provider| ProviderStatusDto {
            provider: *provider,
            configured: sync.registry().is_available(*provider),
        })
        .collect();
    ok(SyncStatusDto {
        status: sync.status(),
        providers,
    })
}

pub async fn test_sync(
    State(state): State<AppState>,
    Json(req): Json<SyncTestRequest>,
) -> Response {
    match state.session.sync().test_connection(req.provider).await {
        Ok(()) => ok(serde_json::json!({ "provider": req.provider, "reachable": true })),
        Err(err) => sync_error(err),
    }
}
