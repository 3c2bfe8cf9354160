//! 存储接口 Trait 定义
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发
//! - 列表保持插入顺序

use crate::error::StorageError;
use async_trait::async_trait;
use domain::DeviceConfiguration;

/// 设备配置存储接口
///
/// 后写覆盖先写，不提供编辑锁。
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// 按插入顺序列出所有配置
    async fn list_configurations(&self) -> Result<Vec<DeviceConfiguration>, StorageError>;

    /// 查找指定配置
    async fn find_configuration(
        &self,
        id: &str,
    ) -> Result<Option<DeviceConfiguration>, StorageError>;

    /// 新增配置（ID 必须唯一）
    async fn create_configuration(
        &self,
        record: DeviceConfiguration,
    ) -> Result<DeviceConfiguration, StorageError>;

    /// 按 `record.id` 整体替换配置，不存在时返回 None
    async fn update_configuration(
        &self,
        record: DeviceConfiguration,
    ) -> Result<Option<DeviceConfiguration>, StorageError>;

    /// 删除配置，返回是否存在
    async fn delete_configuration(&self, id: &str) -> Result<bool, StorageError>;
}
