//! 验证辅助函数
//!
//! 对应配置表单的字段校验：
//! - 名称非空
//! - TCP：主机非空、端口非 0
//! - RTU：串口名非空、波特率大于 0
//! - 寄存器数量 1..=2000，起始地址加数量不越过 0xFFFF
//! - 同步间隔大于 0

use crate::error::StorageError;
use domain::{DeviceConfiguration, Transport};

/// 单次读取允许的最大寄存器 / 线圈数量。
pub const MAX_REGISTER_COUNT: u16 = 2000;

/// 校验设备配置字段
pub fn ensure_valid_configuration(config: &DeviceConfiguration) -> Result<(), StorageError> {
    if config.id.trim().is_empty() {
        return Err(StorageError::new("id required"));
    }
    if config.name.trim().is_empty() {
        return Err(StorageError::new("name required"));
    }
    match &config.transport {
        Transport::Tcp { host, port } => {
            if host.trim().is_empty() {
                return Err(StorageError::new("ip address required"));
            }
            if *port == 0 {
                return Err(StorageError::new("port must be non-zero"));
            }
        }
        Transport::Rtu {
            serial_port,
            baud_rate,
            ..
        } => {
            if serial_port.trim().is_empty() {
                return Err(StorageError::new("serial port required"));
            }
            if *baud_rate == 0 {
                return Err(StorageError::new("baud rate must be positive"));
            }
        }
    }
    if config.register_count == 0 || config.register_count > MAX_REGISTER_COUNT {
        return Err(StorageError::new(format!(
            "register count must be within 1..={}",
            MAX_REGISTER_COUNT
        )));
    }
    if u32::from(config.register_address) + u32::from(config.register_count) > 0x1_0000 {
        return Err(StorageError::new("register range exceeds address space"));
    }
    if let Some(policy) = &config.cloud_sync {
        if policy.interval == 0 {
            return Err(StorageError::new("sync interval must be positive"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::default_configurations;

    #[test]
    fn defaults_are_valid() {
        for config in default_configurations() {
            ensure_valid_configuration(&config).expect("valid");
        }
    }

    #[test]
    fn rejects_zero_port_and_empty_name() {
        let mut config = default_configurations().remove(0);
        config.transport = Transport::Tcp {
            host: "192.168.1.10".to_string(),
            port: 0,
        };
        let err = ensure_valid_configuration(&config).expect_err("port");
        assert_eq!(err.to_string(), "port must be non-zero");

        config.transport = Transport::Tcp {
            host: "192.168.1.10".to_string(),
            port: 502,
        };
        config.name = "  ".to_string();
        let err = ensure_valid_configuration(&config).expect_err("name");
        assert_eq!(err.to_string(), "name required");
    }

    #[test]
    fn rejects_register_count_out_of_range() {
        let mut config = default_configurations().remove(1);
        config.register_count = MAX_REGISTER_COUNT + 1;
        assert!(ensure_valid_configuration(&config).is_err());
    }

    #[test]
    fn rejects_range_past_last_address() {
        let mut config = default_configurations().remove(0);
        config.register_address = 0xFFFF;
        config.register_count = 1;
        ensure_valid_configuration(&config).expect("last address");

        config.register_count = 2;
        let err = ensure_valid_configuration(&config).expect_err("overflow");
        assert_eq!(err.to_string(), "register range exceeds address space");
    }
}
