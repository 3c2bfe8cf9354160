//! PLC 监控 HTTP API：设备配置、会话连接、采样历史与云同步状态。

mod handlers;
mod middleware;
mod routes;
mod utils;

use axum::Router;
use domain::SyncProvider;
use plc_config::{AppConfig, DriverKind};
use plc_protocol::{
    DeviceDriver, ModbusReadKind, ModbusTcpConfig, ModbusTcpDriver, SimulatedDriver,
    SimulatedSettings,
};
use plc_session::{SessionManager, SessionSettings};
use plc_storage::InMemoryConfigurationStore;
use plc_sync::{
    BackendRegistry, CloudSyncController, FirebaseBackend, FirebaseCredentials,
    InMemorySyncBackend, SyncTimings,
};
use plc_telemetry::{Notifier, init_tracing};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub session: SessionManager,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let store = if config.seed_defaults {
        Arc::new(InMemoryConfigurationStore::with_defaults())
    } else {
        Arc::new(InMemoryConfigurationStore::new())
    };
    let driver = build_driver(&config)?;
    let notifier = Notifier::default();
    let sync = CloudSyncController::new(
        build_registry(&config),
        notifier.clone(),
        SyncTimings {
            network_delay: Duration::from_millis(config.sync_delay_ms),
            synced_hold: Duration::from_millis(config.sync_synced_hold_ms),
            failed_hold: Duration::from_millis(config.sync_failed_hold_ms),
        },
    );
    let session = SessionManager::new(
        store,
        driver,
        sync,
        notifier,
        SessionSettings {
            tick_interval: Duration::from_millis(config.sample_interval_ms),
            history_capacity: config.history_capacity,
        },
    );
    let app = build_app(AppState {
        session: session.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "plc.api", addr = %config.http_addr, driver = ?config.driver, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    session.disconnect();
    Ok(())
}

/// 组装路由与中间件
pub fn build_app(state: AppState) -> Router {
    routes::create_api_router()
        .with_state(state)
        // 注入 request_id/trace_id，外层记录 HTTP 访问日志
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::request_context)),
        )
}

fn build_driver(config: &AppConfig) -> Result<Arc<dyn DeviceDriver>, Box<dyn std::error::Error>> {
    match config.driver {
        DriverKind::Simulated => Ok(Arc::new(SimulatedDriver::random(SimulatedSettings {
            connect_delay: Duration::from_millis(config.connect_delay_ms),
            connect_jitter: Duration::from_millis(config.connect_jitter_ms),
            success_rate: config.connect_success_rate,
        }))),
        DriverKind::Modbus => {
            let read_kind = config.modbus_read_kind.parse::<ModbusReadKind>()?;
            Ok(Arc::new(ModbusTcpDriver::new(ModbusTcpConfig {
                read_kind,
                connect_timeout_ms: config.connect_timeout_ms,
                read_timeout_ms: config.read_timeout_ms,
            })))
        }
    }
}

/// Firebase 走 REST；其余提供方没有原生客户端，写入内存后端
fn build_registry(config: &AppConfig) -> BackendRegistry {
    let firebase = &config.firebase;
    let credentials = FirebaseCredentials {
        api_key: firebase.api_key.clone(),
        auth_domain: firebase.auth_domain.clone(),
        database_url: firebase.database_url.clone(),
        project_id: firebase.project_id.clone(),
        storage_bucket: firebase.storage_bucket.clone(),
        messaging_sender_id: firebase.messaging_sender_id.clone(),
        app_id: firebase.app_id.clone(),
    };
    if !credentials.is_configured() {
        tracing::warn!(target: "plc.api", "firebase is not configured with valid credentials");
    }
    let mut registry = BackendRegistry::new().with(
        SyncProvider::Firebase,
        Arc::new(FirebaseBackend::new(
            credentials,
            Duration::from_millis(firebase.poll_interval_ms),
        )),
    );
    for provider in [SyncProvider::Azure, SyncProvider::Aws, SyncProvider::Custom] {
        registry.insert(provider, Arc::new(InMemorySyncBackend::new()));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use plc_protocol::FixedOutcome;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_state(roll: f64, firebase: Arc<InMemorySyncBackend>) -> AppState {
        let notifier = Notifier::default();
        let registry = BackendRegistry::new().with(SyncProvider::Firebase, firebase);
        let sync = CloudSyncController::new(registry, notifier.clone(), SyncTimings::default());
        let driver = SimulatedDriver::new(SimulatedSettings::default(), Arc::new(FixedOutcome(roll)));
        let session = SessionManager::new(
            Arc::new(InMemoryConfigurationStore::with_defaults()),
            Arc::new(driver),
            sync,
            notifier,
            SessionSettings::default(),
        );
        AppState { session }
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => request.body(Body::empty()).expect("request"),
        };
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_sets_request_ids() {
        let app = build_app(test_state(0.6, Arc::new(InMemorySyncBackend::new())));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-trace-id"));
    }

    #[tokio::test]
    async fn configuration_crud_round_trip() {
        let app = build_app(test_state(0.6, Arc::new(InMemorySyncBackend::new())));

        let (status, body) = send(&app, "GET", "/configurations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

        let payload = json!({
            "id": "press-3",
            "name": " Press PLC ",
            "type": "tcp",
            "ipAddress": "192.168.1.30",
            "port": 502
        });
        let (status, body) = send(&app, "POST", "/configurations", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Press PLC");
        assert_eq!(body["data"]["registerAddress"], 0x6304);

        let (status, body) = send(&app, "POST", "/configurations", Some(payload)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "RESOURCE.CONFLICT");

        let update = json!({
            "name": "Press PLC",
            "type": "rtu",
            "serialPort": "COM3",
            "baudRate": 19200,
            "parity": "E"
        });
        let (status, body) = send(&app, "PUT", "/configurations/press-3", Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["type"], "rtu");

        let (status, _) = send(&app, "DELETE", "/configurations/press-3", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, "GET", "/configurations/press-3", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn invalid_configuration_is_rejected() {
        let app = build_app(test_state(0.6, Arc::new(InMemorySyncBackend::new())));
        let payload = json!({
            "name": "Bad PLC",
            "type": "tcp",
            "ipAddress": "192.168.1.30",
            "port": 0
        });
        let (status, body) = send(&app, "POST", "/configurations", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "port must be non-zero");
    }

    #[tokio::test(start_paused = true)]
    async fn connect_and_disconnect_over_http() {
        let app = build_app(test_state(0.6, Arc::new(InMemorySyncBackend::new())));

        let (status, body) = send(
            &app,
            "POST",
            "/session/connect",
            Some(json!({ "configurationId": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "connected");
        assert_eq!(body["data"]["session"]["configuration"]["id"], "1");

        tokio::time::sleep(Duration::from_millis(5100)).await;
        let (_, body) = send(&app, "GET", "/session/samples", None).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["data"][0]["values"], json!([true]));

        let (status, body) = send(&app, "POST", "/session/disconnect", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["disconnected"], true);
        let (_, body) = send(&app, "POST", "/session/disconnect", None).await;
        assert_eq!(body["data"]["disconnected"], false);

        let (_, body) = send(&app, "GET", "/session", None).await;
        assert_eq!(body["data"]["status"], "disconnected");
        assert_eq!(body["data"]["sampleCount"], 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connect_maps_to_bad_gateway() {
        let app = build_app(test_state(0.95, Arc::new(InMemorySyncBackend::new())));
        let (status, body) = send(
            &app,
            "POST",
            "/session/connect",
            Some(json!({ "configurationId": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "SESSION.CONNECTION_FAILED");

        let (status, _) = send(
            &app,
            "POST",
            "/session/connect",
            Some(json!({ "configurationId": "missing" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn samples_export_as_csv() {
        let app = build_app(test_state(0.6, Arc::new(InMemorySyncBackend::new())));
        send(
            &app,
            "POST",
            "/session/connect",
            Some(json!({ "configurationId": "1" })),
        )
        .await;
        tokio::time::sleep(Duration::from_millis(10_100)).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/session/samples.csv")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/csv; charset=utf-8"
        );
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let csv = String::from_utf8(bytes.to_vec()).expect("utf8");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,values");
        assert!(lines[1].ends_with(",true"));
    }

    #[tokio::test]
    async fn sync_status_and_publish() {
        let firebase = Arc::new(InMemorySyncBackend::new());
        let app = build_app(test_state(0.6, firebase.clone()));

        let (_, body) = send(&app, "GET", "/sync/status", None).await;
        assert_eq!(body["data"]["status"], "idle");
        assert_eq!(body["data"]["providers"][0]["provider"], "firebase");
        assert_eq!(body["data"]["providers"][0]["configured"], true);
        assert_eq!(body["data"]["providers"][1]["configured"], false);

        let (status, _) = send(&app, "POST", "/configurations/1/publish", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(firebase.node("plc-configurations/1")["name"], "Factory Floor PLC");

        let (status, _) = send(&app, "POST", "/sync/test", Some(json!({ "provider": "firebase" }))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, "POST", "/sync/test", Some(json!({ "provider": "aws" }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SYNC.UNAVAILABLE");
    }
}
