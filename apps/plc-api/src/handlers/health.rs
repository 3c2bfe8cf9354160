//! 健康检查与指标快照
//!
//! - GET /health
//! - GET /metrics

use crate::utils::ok;
use api_contract::MetricsSnapshotDto;
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use plc_telemetry::metrics;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    ok(MetricsSnapshotDto {
        connect_attempts: snapshot.connect_attempts,
        connect_success: snapshot.connect_success,
        connect_failure: snapshot.connect_failure,
        samples_emitted: snapshot.samples_emitted,
        samples_evicted: snapshot.samples_evicted,
        sample_read_failure: snapshot.sample_read_failure,
        sync_attempts: snapshot.sync_attempts,
        sync_success: snapshot.sync_success,
        sync_failure: snapshot.sync_failure,
        sync_unavailable: snapshot.sync_unavailable,
    })
}
