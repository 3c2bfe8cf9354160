//! 设备配置内存存储实现
//!
//! 功能：
//! - 配置 CRUD 操作
//! - 保持插入顺序
//! - 可选预置两台默认 PLC

use crate::error::StorageError;
use crate::traits::ConfigurationStore;
use domain::{DeviceConfiguration, Parity, SyncPolicy, SyncProvider, Transport};
use std::sync::RwLock;

/// 设备配置内存存储
///
/// 使用 RwLock + Vec 提供线程安全且有序的内存存储。
pub struct InMemoryConfigurationStore {
    configurations: RwLock<Vec<DeviceConfiguration>>,
}

impl InMemoryConfigurationStore {
    /// 创建空的配置存储
    pub fn new() -> Self {
        Self {
            configurations: RwLock::new(Vec::new()),
        }
    }

    /// 创建预置默认配置的存储
    pub fn with_defaults() -> Self {
        Self {
            configurations: RwLock::new(default_configurations()),
        }
    }

    /// 配置数量（用于测试）
    pub fn len(&self) -> usize {
        self.configurations.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryConfigurationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ConfigurationStore for InMemoryConfigurationStore {
    async fn list_configurations(&self) -> Result<Vec<DeviceConfiguration>, StorageError> {
        let items = self
            .configurations
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(items.clone())
    }

    async fn find_configuration(
        &self,
        id: &str,
    ) -> Result<Option<DeviceConfiguration>, StorageError> {
        let items = self
            .configurations
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn create_configuration(
        &self,
        record: DeviceConfiguration,
    ) -> Result<DeviceConfiguration, StorageError> {
        let mut items = self
            .configurations
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if items.iter().any(|item| item.id == record.id) {
            return Err(StorageError::duplicate());
        }
        items.push(record.clone());
        Ok(record)
    }

    async fn update_configuration(
        &self,
        record: DeviceConfiguration,
    ) -> Result<Option<DeviceConfiguration>, StorageError> {
        let mut items = self
            .configurations
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let existing = match items.iter_mut().find(|item| item.id == record.id) {
            Some(existing) => existing,
            None => return Ok(None),
        };
        *existing = record.clone();
        Ok(Some(record))
    }

    async fn delete_configuration(&self, id: &str) -> Result<bool, StorageError> {
        let mut items = self
            .configurations
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let before = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() != before)
    }
}

/// 预置的两台 PLC：厂区 TCP 与装配线 RTU。
pub fn default_configurations() -> Vec<DeviceConfiguration> {
    vec![
        DeviceConfiguration {
            id: "1".to_string(),
            name: "Factory Floor PLC".to_string(),
            transport: Transport::Tcp {
                host: "192.168.1.10".to_string(),
                port: 502,
            },
            unit_id: 1,
            register_address: 0x6304,
            register_count: 1,
            description: Some("Main factory floor PLC monitoring system".to_string()),
            cloud_sync: Some(SyncPolicy {
                enabled: true,
                interval: 5,
                provider: SyncProvider::Firebase,
            }),
        },
        DeviceConfiguration {
            id: "2".to_string(),
            name: "Assembly Line PLC".to_string(),
            transport: Transport::Rtu {
                serial_port: "COM8".to_string(),
                baud_rate: 9600,
                parity: Parity::Odd,
            },
            unit_id: 1,
            register_address: 0x6304,
            register_count: 1,
            description: Some("Assembly line control system".to_string()),
            cloud_sync: Some(SyncPolicy {
                enabled: true,
                interval: 10,
                provider: SyncProvider::Firebase,
            }),
        },
    ]
}
