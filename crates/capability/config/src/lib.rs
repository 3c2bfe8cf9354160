//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 设备驱动类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    /// 模拟驱动（定时 + 随机结果）
    Simulated,
    /// Modbus TCP 驱动
    Modbus,
}

/// Firebase 凭据。未设置的字段保留占位值，`is_configured` 据此判断。
#[derive(Debug, Clone)]
pub struct FirebaseSettings {
    pub api_key: String,
    pub auth_domain: String,
    pub database_url: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    pub poll_interval_ms: u64,
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub driver: DriverKind,
    pub modbus_read_kind: String,
    pub sample_interval_ms: u64,
    pub history_capacity: usize,
    pub connect_delay_ms: u64,
    pub connect_jitter_ms: u64,
    pub connect_success_rate: f64,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub sync_delay_ms: u64,
    pub sync_synced_hold_ms: u64,
    pub sync_failed_hold_ms: u64,
    pub seed_defaults: bool,
    pub firebase: FirebaseSettings,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr = env::var("PLC_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let driver = read_driver("PLC_DRIVER")?;
        let modbus_read_kind =
            env::var("PLC_MODBUS_READ_KIND").unwrap_or_else(|_| "coils".to_string());
        let sample_interval_ms = read_positive_u64_with_default("PLC_SAMPLE_INTERVAL_MS", 5000)?;
        let history_capacity =
            read_positive_u64_with_default("PLC_HISTORY_CAPACITY", 100)? as usize;
        let connect_delay_ms = read_u64_with_default("PLC_CONNECT_DELAY_MS", 2000)?;
        let connect_jitter_ms = read_u64_with_default("PLC_CONNECT_JITTER_MS", 0)?;
        let connect_success_rate = read_rate_with_default("PLC_CONNECT_SUCCESS_RATE", 0.7)?;
        let connect_timeout_ms = read_positive_u64_with_default("PLC_CONNECT_TIMEOUT_MS", 5000)?;
        let read_timeout_ms = read_positive_u64_with_default("PLC_READ_TIMEOUT_MS", 3000)?;
        let sync_delay_ms = read_u64_with_default("PLC_SYNC_DELAY_MS", 1000)?;
        let sync_synced_hold_ms = read_u64_with_default("PLC_SYNC_SYNCED_HOLD_MS", 1000)?;
        let sync_failed_hold_ms = read_u64_with_default("PLC_SYNC_FAILED_HOLD_MS", 3000)?;
        let seed_defaults = read_bool_with_default("PLC_SEED_DEFAULTS", true)?;

        let firebase = FirebaseSettings {
            api_key: read_with_placeholder("FIREBASE_API_KEY", "YOUR_API_KEY"),
            auth_domain: read_with_placeholder("FIREBASE_AUTH_DOMAIN", "YOUR_AUTH_DOMAIN"),
            database_url: read_with_placeholder("FIREBASE_DATABASE_URL", "YOUR_DATABASE_URL"),
            project_id: read_with_placeholder("FIREBASE_PROJECT_ID", "YOUR_PROJECT_ID"),
            storage_bucket: read_with_placeholder(
                "FIREBASE_STORAGE_BUCKET",
                "YOUR_STORAGE_BUCKET",
            ),
            messaging_sender_id: read_with_placeholder(
                "FIREBASE_MESSAGING_SENDER_ID",
                "YOUR_MESSAGING_SENDER_ID",
            ),
            app_id: read_with_placeholder("FIREBASE_APP_ID", "YOUR_APP_ID"),
            poll_interval_ms: read_positive_u64_with_default("PLC_FIREBASE_POLL_MS", 2000)?,
        };

        Ok(Self {
            http_addr,
            driver,
            modbus_read_kind,
            sample_interval_ms,
            history_capacity,
            connect_delay_ms,
            connect_jitter_ms,
            connect_success_rate,
            connect_timeout_ms,
            read_timeout_ms,
            sync_delay_ms,
            sync_synced_hold_ms,
            sync_failed_hold_ms,
            seed_defaults,
            firebase,
        })
    }
}

fn read_driver(key: &str) -> Result<DriverKind, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(DriverKind::Simulated),
    };
    match value.to_ascii_lowercase().as_str() {
        "simulated" | "sim" => Ok(DriverKind::Simulated),
        "modbus" | "modbus-tcp" => Ok(DriverKind::Modbus),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_positive_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = read_u64_with_default(key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid(key.to_string(), "0".to_string()));
    }
    Ok(value)
}

/// 读取 [0, 1] 区间的概率值。
fn read_rate_with_default(key: &str, default: f64) -> Result<f64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    match value.parse::<f64>() {
        Ok(rate) if (0.0..=1.0).contains(&rate) => Ok(rate),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}

fn read_with_placeholder(key: &str, placeholder: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => placeholder.to_string(),
    }
}

fn read_bool_with_default(key: &str, default: bool) -> Result<bool, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}
