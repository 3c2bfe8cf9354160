//! 稳定的 DTO 与 API 响应契约。

use chrono::{DateTime, Utc};
use domain::{
    ActiveSession, ConnectionStatus, DeviceConfiguration, SyncPolicy, SyncProvider, SyncStatus,
    Transport,
};
use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

fn default_unit_id() -> u8 {
    1
}

fn default_register_address() -> u16 {
    0x6304
}

fn default_register_count() -> u16 {
    1
}

/// 设备配置创建 / 更新请求体。
///
/// 创建时 `id` 可省略（由服务端生成）；更新时以路径中的 id 为准。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub transport: Transport,
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,
    #[serde(default = "default_register_address")]
    pub register_address: u16,
    #[serde(default = "default_register_count")]
    pub register_count: u16,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cloud_sync: Option<SyncPolicy>,
}

impl ConfigurationRequest {
    pub fn into_configuration(self, id: String) -> DeviceConfiguration {
        DeviceConfiguration {
            id,
            name: self.name,
            transport: self.transport,
            unit_id: self.unit_id,
            register_address: self.register_address,
            register_count: self.register_count,
            description: self.description,
            cloud_sync: self.cloud_sync,
        }
    }
}

/// 连接请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub configuration_id: String,
}

/// 会话状态返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub status: ConnectionStatus,
    pub session: Option<ActiveSession>,
    pub sample_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub sync_status: SyncStatus,
}

/// 断开结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectDto {
    pub disconnected: bool,
}

/// 单个同步提供方的可用性。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatusDto {
    pub provider: SyncProvider,
    pub configured: bool,
}

/// 云同步状态返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusDto {
    pub status: SyncStatus,
    pub providers: Vec<ProviderStatusDto>,
}

/// 云连接测试请求体。
#[derive(Debug, Deserialize)]
pub struct SyncTestRequest {
    pub provider: SyncProvider,
}

/// 运行指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub connect_attempts: u64,
    pub connect_success: u64,
    pub connect_failure: u64,
    pub samples_emitted: u64,
    pub samples_evicted: u64,
    pub sample_read_failure: u64,
    pub sync_attempts: u64,
    pub sync_success: u64,
    pub sync_failure: u64,
    pub sync_unavailable: u64,
}
