//! 会话 handlers
//!
//! - GET /session - 连接状态与最近更新时间
//! - POST /session/connect - 按配置 id 连接（等待连接结果）
//! - POST /session/disconnect - 断开（幂等）
//! - GET /session/samples - 采样历史
//! - GET /session/samples.csv - 导出 CSV

use crate::AppState;
use crate::utils::{normalize_required, ok, session_error};
use api_contract::{ConnectRequest, DisconnectDto, SessionDto};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use plc_session::SessionManager;

fn session_dto(session: &SessionManager) -> SessionDto {
    let snapshot = session.snapshot();
    SessionDto {
        status: snapshot.status,
        session: snapshot.session,
        sample_count: snapshot.sample_count,
        last_updated: snapshot.last_updated,
        sync_status: session.sync().status(),
    }
}

pub async fn get_session(State(state): State<AppState>) -> Response {
    ok(session_dto(&state.session))
}

pub async fn connect(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> Response {
    let id = match normalize_required(req.configuration_id, "configurationId") {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.session.connect_by_id(&id).await {
        Ok(_) => ok(session_dto(&state.session)),
        Err(err) => session_error(err),
    }
}

pub async fn disconnect(State(state): State<AppState>) -> Response {
    let disconnected = state.session.disconnect();
    ok(DisconnectDto { disconnected })
}

pub async fn list_samples(State(state): State<AppState>) -> Response {
    ok(state.session.history())
}

pub async fn export_samples(State(state): State<AppState>) -> Response {
    match state.session.history_csv() {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"plc-samples.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => session_error(err),
    }
}
