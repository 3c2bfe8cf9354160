//! Modbus TCP 驱动实现
//!
//! 连接 Modbus 从设备，每个采样周期按配置读取线圈或寄存器。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let driver = ModbusTcpDriver::new(ModbusTcpConfig::default());
//! let mut link = driver.open(&config).await?;
//! let values = link.read().await?;
//! ```

use crate::driver::{DeviceDriver, DeviceLink};
use crate::error::ProtocolError;
use crate::types::ModbusReadKind;
use async_trait::async_trait;
use domain::{DeviceConfiguration, RegisterValue, Transport};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_modbus::prelude::*;
use tracing::{debug, info};

/// Modbus TCP 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModbusTcpConfig {
    /// 读取方式
    #[serde(default)]
    pub read_kind: ModbusReadKind,
    /// 连接超时（毫秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// 读取超时（毫秒）
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_read_timeout() -> u64 {
    3000
}

impl Default for ModbusTcpConfig {
    fn default() -> Self {
        Self {
            read_kind: ModbusReadKind::default(),
            connect_timeout_ms: default_connect_timeout(),
            read_timeout_ms: default_read_timeout(),
        }
    }
}

/// Modbus TCP 驱动
pub struct ModbusTcpDriver {
    config: ModbusTcpConfig,
}

impl ModbusTcpDriver {
    /// 创建新的 Modbus TCP 驱动
    pub fn new(config: ModbusTcpConfig) -> Self {
        Self { config }
    }

    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        let config: ModbusTcpConfig =
            serde_json::from_str(json).map_err(|e| ProtocolError::ConfigParse(e.to_string()))?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &ModbusTcpConfig {
        &self.config
    }
}

#[async_trait]
impl DeviceDriver for ModbusTcpDriver {
    async fn open(
        &self,
        config: &DeviceConfiguration,
    ) -> Result<Box<dyn DeviceLink>, ProtocolError> {
        let (host, port) = match &config.transport {
            Transport::Tcp { host, port } => (host.as_str(), *port),
            Transport::Rtu { serial_port, .. } => {
                return Err(ProtocolError::Unsupported(format!(
                    "serial port {} requires an rtu driver",
                    serial_port
                )));
            }
        };
        check_range(self.config.read_kind, config.register_address, config.register_count)?;

        // 域名解析与建立连接共用同一个超时
        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let deadline = Instant::now() + connect_timeout;
        let addr = timeout_at(deadline, resolve(host, port))
            .await
            .map_err(|_| ProtocolError::Timeout(format!("resolve {}", host)))??;

        info!(
            target: "plc.protocol",
            config_id = %config.id,
            %addr,
            unit_id = config.unit_id,
            "connecting to modbus server"
        );

        // 连接 Modbus 服务器
        let ctx = timeout_at(deadline, tcp::connect_slave(addr, Slave(config.unit_id)))
        .await
        .map_err(|_| ProtocolError::Timeout(format!("connect to {}", addr)))?
        .map_err(|e| ProtocolError::Connection(e.to_string()))?;

        info!(target: "plc.protocol", %addr, "connected to modbus server");

        Ok(Box::new(ModbusTcpLink {
            ctx,
            read_kind: self.config.read_kind,
            register_address: config.register_address,
            register_count: config.register_count,
            read_timeout: Duration::from_millis(self.config.read_timeout_ms),
        }))
    }
}

/// 读取范围检查：数量不超过功能码上限，且不越过 0xFFFF 地址
fn check_range(kind: ModbusReadKind, address: u16, count: u16) -> Result<(), ProtocolError> {
    if count == 0 || count > kind.max_count() {
        return Err(ProtocolError::ConfigParse(format!(
            "function {} reads 1..={} items, got {}",
            kind.function_code(),
            kind.max_count(),
            count
        )));
    }
    if u32::from(address) + u32::from(count) > 0x1_0000 {
        return Err(ProtocolError::ConfigParse(format!(
            "address {:#06x} + {} exceeds the register space",
            address, count
        )));
    }
    Ok(())
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ProtocolError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| ProtocolError::Connection(format!("unable to resolve {}", host)))
}

struct ModbusTcpLink {
    ctx: tokio_modbus::client::Context,
    read_kind: ModbusReadKind,
    register_address: u16,
    register_count: u16,
    read_timeout: Duration,
}

#[async_trait]
impl DeviceLink for ModbusTcpLink {
    async fn read(&mut self) -> Result<Vec<RegisterValue>, ProtocolError> {
        let address = self.register_address;
        let count = self.register_count;
        let deadline = self.read_timeout;
        let timed_out = || ProtocolError::Timeout(format!("read {} x{}", address, count));

        let values = match self.read_kind {
            ModbusReadKind::Coils => timeout(deadline, self.ctx.read_coils(address, count))
                .await
                .map_err(|_| timed_out())?
                .map_err(|e| ProtocolError::Modbus(e.to_string()))?
                .map_err(|e| ProtocolError::Modbus(format!("exception: {:?}", e)))?
                .into_iter()
                .map(RegisterValue::Bool)
                .collect::<Vec<_>>(),
            ModbusReadKind::DiscreteInputs => {
                timeout(deadline, self.ctx.read_discrete_inputs(address, count))
                    .await
                    .map_err(|_| timed_out())?
                    .map_err(|e| ProtocolError::Modbus(e.to_string()))?
                    .map_err(|e| ProtocolError::Modbus(format!("exception: {:?}", e)))?
                    .into_iter()
                    .map(RegisterValue::Bool)
                    .collect()
            }
            ModbusReadKind::HoldingRegisters => {
                timeout(deadline, self.ctx.read_holding_registers(address, count))
                    .await
                    .map_err(|_| timed_out())?
                    .map_err(|e| ProtocolError::Modbus(e.to_string()))?
                    .map_err(|e| ProtocolError::Modbus(format!("exception: {:?}", e)))?
                    .into_iter()
                    .map(|word| RegisterValue::Number(f64::from(word)))
                    .collect()
            }
            ModbusReadKind::InputRegisters => {
                timeout(deadline, self.ctx.read_input_registers(address, count))
                    .await
                    .map_err(|_| timed_out())?
                    .map_err(|e| ProtocolError::Modbus(e.to_string()))?
                    .map_err(|e| ProtocolError::Modbus(format!("exception: {:?}", e)))?
                    .into_iter()
                    .map(|word| RegisterValue::Number(f64::from(word)))
                    .collect()
            }
        };

        // 线圈按字节返回，截掉尾部填充位
        let mut values = values;
        values.truncate(count as usize);

        debug!(
            target: "plc.protocol",
            function_code = self.read_kind.function_code(),
            register = address,
            count,
            values = ?values,
            "read modbus values"
        );
        Ok(values)
    }
}
