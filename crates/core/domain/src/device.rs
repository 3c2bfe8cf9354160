//! 设备连接配置。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 设备连接配置：一台 PLC 的传输参数、寻址与同步策略。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfiguration {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub transport: Transport,
    pub unit_id: u8,
    pub register_address: u16,
    pub register_count: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_sync: Option<SyncPolicy>,
}

impl DeviceConfiguration {
    /// 当前配置是否启用了云同步。
    pub fn sync_enabled(&self) -> bool {
        self.cloud_sync.as_ref().is_some_and(|policy| policy.enabled)
    }

    /// 已启用的同步策略（未启用时为 None）。
    pub fn active_sync_policy(&self) -> Option<&SyncPolicy> {
        self.cloud_sync.as_ref().filter(|policy| policy.enabled)
    }

    /// 便于日志与界面展示的连接端点描述。
    pub fn endpoint(&self) -> String {
        match &self.transport {
            Transport::Tcp { host, port } => format!("TCP: {}:{}", host, port),
            Transport::Rtu {
                serial_port,
                baud_rate,
                ..
            } => format!("RTU: {} @ {}", serial_port, baud_rate),
        }
    }
}

/// 传输方式，JSON 中以 `type` 字段区分（`tcp` / `rtu`）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transport {
    Tcp {
        #[serde(rename = "ipAddress")]
        host: String,
        port: u16,
    },
    Rtu {
        #[serde(rename = "serialPort")]
        serial_port: String,
        #[serde(rename = "baudRate")]
        baud_rate: u32,
        parity: Parity,
    },
}

/// 串口校验位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    #[serde(rename = "N", alias = "none")]
    None,
    #[serde(rename = "E", alias = "even")]
    Even,
    #[serde(rename = "O", alias = "odd")]
    Odd,
}

/// 嵌入在设备配置中的云同步策略。
///
/// `interval` 仅作展示用途：实际同步由采样周期驱动。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    pub enabled: bool,
    pub interval: u32,
    pub provider: SyncProvider,
}

/// 同步后端提供方。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncProvider {
    Firebase,
    Azure,
    Aws,
    Custom,
}

impl SyncProvider {
    pub const ALL: [SyncProvider; 4] = [Self::Firebase, Self::Azure, Self::Aws, Self::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Firebase => "firebase",
            Self::Azure => "azure",
            Self::Aws => "aws",
            Self::Custom => "custom",
        }
    }

    /// 面向用户的显示名称
    pub fn label(&self) -> &'static str {
        match self {
            Self::Firebase => "Firebase",
            Self::Azure => "Azure",
            Self::Aws => "AWS",
            Self::Custom => "Custom",
        }
    }
}

impl fmt::Display for SyncProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
