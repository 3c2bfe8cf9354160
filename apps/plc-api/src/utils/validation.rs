//! 输入验证辅助函数
//!
//! - normalize_required：去除首尾空格并检查非空
//! - validate_configuration：设备配置字段校验，失败返回 bad_request_error 响应

use crate::utils::response::bad_request_error;
use axum::response::Response;
use domain::DeviceConfiguration;
use plc_storage::ensure_valid_configuration;

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: String, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 校验设备配置（名称去除首尾空格）
pub fn validate_configuration(
    mut config: DeviceConfiguration,
) -> Result<DeviceConfiguration, Response> {
    config.name = normalize_required(config.name, "name")?;
    if let Err(err) = ensure_valid_configuration(&config) {
        return Err(bad_request_error(err.to_string()));
    }
    Ok(config)
}
