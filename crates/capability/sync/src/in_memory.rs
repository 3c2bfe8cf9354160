//! 内存同步后端
//!
//! 无原生客户端的提供方和测试使用。路径按字符串整体匹配，不做层级合并。

use crate::backend::{Subscription, SyncBackend, value_set};
use crate::error::SyncError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

#[derive(Default)]
struct PathState {
    node: Value,
    watchers: Option<watch::Sender<Vec<Value>>>,
}

/// 内存同步后端
pub struct InMemorySyncBackend {
    configured: AtomicBool,
    fail_writes: AtomicBool,
    next_key: AtomicU64,
    paths: Mutex<HashMap<String, PathState>>,
}

impl InMemorySyncBackend {
    /// 已配置、写入正常的后端
    pub fn new() -> Self {
        Self {
            configured: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
            next_key: AtomicU64::new(0),
            paths: Mutex::new(HashMap::new()),
        }
    }

    /// 未配置的后端（`is_configured` 返回 false）
    pub fn unconfigured() -> Self {
        let backend = Self::new();
        backend.set_configured(false);
        backend
    }

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::SeqCst);
    }

    /// 让后续写入失败（测试用）
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 路径当前值集合
    pub fn snapshot(&self, path: &str) -> Vec<Value> {
        self.paths
            .lock()
            .ok()
            .and_then(|paths| paths.get(path).map(|state| value_set(&state.node)))
            .unwrap_or_default()
    }

    /// 路径上的原始节点（不存在时为 null）
    pub fn node(&self, path: &str) -> Value {
        self.paths
            .lock()
            .ok()
            .and_then(|paths| paths.get(path).map(|state| state.node.clone()))
            .unwrap_or(Value::Null)
    }

    fn ensure_writable(&self) -> Result<(), SyncError> {
        if !self.configured.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable("backend not configured".to_string()));
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::Delivery("write rejected".to_string()));
        }
        Ok(())
    }

    fn write<F>(&self, path: &str, apply: F) -> Result<(), SyncError>
    where
        F: FnOnce(&mut Value),
    {
        let mut paths = self
            .paths
            .lock()
            .map_err(|_| SyncError::Delivery("lock failed".to_string()))?;
        let state = paths.entry(path.to_string()).or_default();
        apply(&mut state.node);
        if let Some(watchers) = &state.watchers {
            watchers.send_replace(value_set(&state.node));
        }
        Ok(())
    }
}

impl Default for InMemorySyncBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyncBackend for InMemorySyncBackend {
    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), SyncError> {
        self.ensure_writable()?;
        self.write(path, |node| *node = value)
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, SyncError> {
        self.ensure_writable()?;
        // 定长数字键，字典序即写入顺序
        let key = format!("{:020}", self.next_key.fetch_add(1, Ordering::SeqCst));
        self.write(path, |node| {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(children) = node {
                children.insert(key.clone(), value);
            }
        })?;
        Ok(key)
    }

    async fn read(&self, path: &str) -> Result<Vec<Value>, SyncError> {
        if !self.is_configured() {
            return Err(SyncError::Unavailable("backend not configured".to_string()));
        }
        Ok(self.snapshot(path))
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, SyncError> {
        if !self.is_configured() {
            let (_, receiver) = watch::channel(Vec::new());
            return Ok(Subscription::new(receiver, None));
        }
        let mut paths = self
            .paths
            .lock()
            .map_err(|_| SyncError::Read("lock failed".to_string()))?;
        let state = paths.entry(path.to_string()).or_default();
        let receiver = match &state.watchers {
            Some(watchers) => watchers.subscribe(),
            None => {
                let (sender, receiver) = watch::channel(value_set(&state.node));
                state.watchers = Some(sender);
                receiver
            }
        };
        Ok(Subscription::new(receiver, None))
    }
}
