//! 设备驱动抽象
//!
//! - `DeviceDriver`：按设备配置建立连接
//! - `DeviceLink`：已建立的连接，每个采样周期读取一次

use crate::error::ProtocolError;
use async_trait::async_trait;
use domain::{DeviceConfiguration, RegisterValue};

/// 设备驱动
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    /// 建立连接；失败即本次连接尝试终止，不自动重试
    async fn open(
        &self,
        config: &DeviceConfiguration,
    ) -> Result<Box<dyn DeviceLink>, ProtocolError>;
}

/// 设备连接
#[async_trait]
pub trait DeviceLink: Send {
    /// 读取一次线圈 / 寄存器
    async fn read(&mut self) -> Result<Vec<RegisterValue>, ProtocolError>;
}
