//! 云同步控制器
//!
//! 状态机：`idle -> syncing -> {synced | failed} -> idle`。
//! 终态保持固定时长后回落到 idle；回落定时器只回落自己对应的那次转换，
//! 之后若有新的转换则放弃。

use crate::backend::{
    BackendRegistry, CONFIGURATION_ROOT, Subscription, SyncBackend, configuration_path, data_path,
};
use crate::error::SyncError;
use domain::{DeviceConfiguration, Notification, Sample, SyncProvider, SyncStatus};
use plc_telemetry::{
    Notifier, record_sync_attempt, record_sync_failure, record_sync_success,
    record_sync_unavailable,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// 同步时序参数
#[derive(Debug, Clone)]
pub struct SyncTimings {
    /// 模拟网络延迟
    pub network_delay: Duration,
    /// synced 保持时长
    pub synced_hold: Duration,
    /// failed 保持时长
    pub failed_hold: Duration,
}

impl Default for SyncTimings {
    fn default() -> Self {
        Self {
            network_delay: Duration::from_millis(1000),
            synced_hold: Duration::from_millis(1000),
            failed_hold: Duration::from_millis(3000),
        }
    }
}

/// 单次 `sync_sample` 的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDispatch {
    /// 配置未启用同步
    Disabled,
    /// 后端缺失或未配置，直接失败
    Unavailable,
    /// 已开始投递
    Started,
}

struct ControllerInner {
    registry: BackendRegistry,
    notifier: Notifier,
    timings: SyncTimings,
    status: watch::Sender<SyncStatus>,
    generation: Mutex<u64>,
}

/// 云同步控制器（可克隆句柄）
#[derive(Clone)]
pub struct CloudSyncController {
    inner: Arc<ControllerInner>,
}

impl CloudSyncController {
    pub fn new(registry: BackendRegistry, notifier: Notifier, timings: SyncTimings) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            inner: Arc::new(ControllerInner {
                registry,
                notifier,
                timings,
                status,
                generation: Mutex::new(0),
            }),
        }
    }

    pub fn status(&self) -> SyncStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.inner.registry
    }

    /// 处理一条新采样。需要在 tokio 运行时内调用，投递在后台进行。
    pub fn sync_sample(&self, config: &DeviceConfiguration, sample: &Sample) -> SyncDispatch {
        let Some(policy) = config.active_sync_policy() else {
            return SyncDispatch::Disabled;
        };
        let provider = policy.provider;
        record_sync_attempt();

        let backend = match self.inner.registry.get(provider) {
            Some(backend) if backend.is_configured() => backend,
            _ => {
                record_sync_unavailable();
                warn!(
                    target: "plc.sync",
                    config_id = %config.id,
                    provider = %provider,
                    "sync backend unavailable"
                );
                self.inner.notifier.notify(Notification::error(
                    "Cloud Sync Failed",
                    format!(
                        "{} is not properly configured. Please update your credentials.",
                        provider.label()
                    ),
                ));
                self.inner.fail();
                return SyncDispatch::Unavailable;
            }
        };

        self.inner.transition(SyncStatus::Syncing);
        let payload = match serde_json::to_value(sample) {
            Ok(payload) => payload,
            Err(err) => {
                self.inner
                    .deliver_failed(&config.id, provider, &SyncError::from(err));
                return SyncDispatch::Started;
            }
        };
        let inner = self.inner.clone();
        let path = data_path(&config.id);
        let config_id = config.id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(inner.timings.network_delay).await;
            match backend.push(&path, payload).await {
                Ok(key) => {
                    record_sync_success();
                    info!(target: "plc.sync", config_id = %config_id, key = %key, "sample synced");
                    inner.succeed();
                }
                Err(err) => inner.deliver_failed(&config_id, provider, &err),
            }
        });
        SyncDispatch::Started
    }

    /// 整体写入设备配置到 `plc-configurations/{configId}`
    pub async fn save_configuration(&self, config: &DeviceConfiguration) -> Result<(), SyncError> {
        let provider = config
            .cloud_sync
            .as_ref()
            .map(|policy| policy.provider)
            .unwrap_or(SyncProvider::Firebase);
        let backend = self.inner.available_backend(provider)?;
        let value = serde_json::to_value(config)?;
        backend.set(&configuration_path(&config.id), value).await?;
        info!(target: "plc.sync", config_id = %config.id, provider = %provider, "configuration saved");
        Ok(())
    }

    /// 探测提供方后端：已配置且可读
    pub async fn test_connection(&self, provider: SyncProvider) -> Result<(), SyncError> {
        self.inner.notifier.notify(Notification::info(
            "Testing Cloud Connection",
            "Please wait while we test the connection...",
        ));
        let result = match self.inner.available_backend(provider) {
            Ok(backend) => backend.read(CONFIGURATION_ROOT).await.map(|_| ()),
            Err(err) => Err(err),
        };
        match &result {
            Ok(()) => self.inner.notifier.notify(Notification::info(
                "Connection Successful",
                "Your cloud configuration is working correctly",
            )),
            Err(err) => self.inner.notifier.notify(Notification::error(
                "Connection Test Failed",
                format!("Unable to reach {}: {}", provider.label(), err),
            )),
        }
        result
    }

    /// 订阅 `plc-data/{configId}` 下的全部采样
    pub async fn subscribe(
        &self,
        provider: SyncProvider,
        config_id: &str,
    ) -> Result<Subscription, SyncError> {
        let backend = self.inner.registry.get(provider).ok_or_else(|| {
            SyncError::Unavailable(format!("no backend registered for {}", provider))
        })?;
        backend.subscribe(&data_path(config_id)).await
    }
}

impl ControllerInner {
    fn generation(&self) -> MutexGuard<'_, u64> {
        match self.generation.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn transition(&self, status: SyncStatus) -> u64 {
        let mut generation = self.generation();
        *generation += 1;
        self.status.send_replace(status);
        *generation
    }

    fn succeed(self: &Arc<Self>) {
        let generation = self.transition(SyncStatus::Synced);
        self.schedule_revert(generation, self.timings.synced_hold);
    }

    fn fail(self: &Arc<Self>) {
        let generation = self.transition(SyncStatus::Failed);
        self.schedule_revert(generation, self.timings.failed_hold);
    }

    fn deliver_failed(self: &Arc<Self>, config_id: &str, provider: SyncProvider, err: &SyncError) {
        record_sync_failure();
        warn!(target: "plc.sync", config_id = %config_id, "sample sync failed: {}", err);
        self.notify_delivery_failure(provider);
        self.fail();
    }

    fn notify_delivery_failure(&self, provider: SyncProvider) {
        self.notifier.notify(Notification::error(
            "Cloud Sync Failed",
            format!(
                "Unable to upload data to {}. Will retry automatically.",
                provider.as_str()
            ),
        ));
    }

    fn schedule_revert(self: &Arc<Self>, generation: u64, hold: Duration) {
        let inner = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            let current = inner.generation();
            if *current == generation {
                inner.status.send_replace(SyncStatus::Idle);
            }
        });
    }

    fn available_backend(
        &self,
        provider: SyncProvider,
    ) -> Result<Arc<dyn SyncBackend>, SyncError> {
        match self.registry.get(provider) {
            Some(backend) if backend.is_configured() => Ok(backend),
            Some(_) => Err(SyncError::Unavailable(format!(
                "{} is not properly configured",
                provider.label()
            ))),
            None => Err(SyncError::Unavailable(format!(
                "no backend registered for {}",
                provider
            ))),
        }
    }
}
