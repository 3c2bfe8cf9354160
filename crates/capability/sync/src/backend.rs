//! 同步后端抽象
//!
//! 键路径存储的写入 / 订阅约定：
//! - `set`：整值覆盖写入（`plc-configurations/{configId}`）
//! - `push`：追加一条，键由后端生成（`plc-data/{configId}/{autoId}`）
//! - `read` / `subscribe`：路径下的完整值集合

use crate::error::SyncError;
use async_trait::async_trait;
use domain::SyncProvider;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 采样数据根路径
pub const DATA_ROOT: &str = "plc-data";
/// 设备配置根路径
pub const CONFIGURATION_ROOT: &str = "plc-configurations";

pub fn data_path(config_id: &str) -> String {
    format!("{}/{}", DATA_ROOT, config_id)
}

pub fn configuration_path(config_id: &str) -> String {
    format!("{}/{}", CONFIGURATION_ROOT, config_id)
}

/// 把路径上的节点展开为值集合：
/// 空节点为空集合，对象取子节点（按键排序），数组跳过空位，其余为单值。
pub fn value_set(node: &Value) -> Vec<Value> {
    match node {
        Value::Null => Vec::new(),
        Value::Object(children) => {
            let mut entries: Vec<(&String, &Value)> = children.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries.into_iter().map(|(_, value)| value.clone()).collect()
        }
        Value::Array(items) => items.iter().filter(|v| !v.is_null()).cloned().collect(),
        other => vec![other.clone()],
    }
}

/// 路径订阅句柄
///
/// 每次路径内容变化时收到完整值集合；drop 或 `unsubscribe` 结束订阅。
pub struct Subscription {
    receiver: watch::Receiver<Vec<Value>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(receiver: watch::Receiver<Vec<Value>>, task: Option<JoinHandle<()>>) -> Self {
        Self { receiver, task }
    }

    /// 当前值集合
    pub fn current(&self) -> Vec<Value> {
        self.receiver.borrow().clone()
    }

    /// 等待下一次变化
    pub async fn changed(&mut self) -> Result<Vec<Value>, SyncError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| SyncError::Unavailable("subscription closed".to_string()))?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// 同步后端
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// 后端是否可用（凭据已配置）
    fn is_configured(&self) -> bool;

    async fn set(&self, path: &str, value: Value) -> Result<(), SyncError>;

    /// 追加写入，返回生成的键
    async fn push(&self, path: &str, value: Value) -> Result<String, SyncError>;

    async fn read(&self, path: &str) -> Result<Vec<Value>, SyncError>;

    async fn subscribe(&self, path: &str) -> Result<Subscription, SyncError>;
}

/// 按提供方注册的同步后端。
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<SyncProvider, Arc<dyn SyncBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: SyncProvider, backend: Arc<dyn SyncBackend>) -> Self {
        self.insert(provider, backend);
        self
    }

    pub fn insert(&mut self, provider: SyncProvider, backend: Arc<dyn SyncBackend>) {
        self.backends.insert(provider, backend);
    }

    pub fn get(&self, provider: SyncProvider) -> Option<Arc<dyn SyncBackend>> {
        self.backends.get(&provider).cloned()
    }

    /// 后端存在且已配置
    pub fn is_available(&self, provider: SyncProvider) -> bool {
        self.backends
            .get(&provider)
            .map(|backend| backend.is_configured())
            .unwrap_or(false)
    }
}
