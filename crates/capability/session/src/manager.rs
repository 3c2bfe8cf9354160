//! 会话管理器
//!
//! 状态机：`disconnected -> connecting -> {connected | disconnected}`。
//! 所有状态转换在同一把锁内完成，锁不跨 `.await` 持有。
//! 每次连接 / 断开递增会话纪元（epoch），携带旧纪元的采样和连接结果一律丢弃。

use crate::error::SessionError;
use crate::scheduler::RepeatingTask;
use chrono::{DateTime, Utc};
use domain::{
    ActiveSession, ConnectionStatus, DeviceConfiguration, Notification, RegisterValue, Sample,
};
use plc_protocol::{DeviceDriver, DeviceLink};
use plc_storage::{ConfigurationStore, DEFAULT_HISTORY_CAPACITY, SampleHistory};
use plc_sync::CloudSyncController;
use plc_telemetry::{
    Notifier, record_connect_attempt, record_connect_failure, record_connect_success,
    record_sample_emitted, record_sample_read_failure,
};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// 会话参数
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// 采样周期
    pub tick_interval: Duration,
    /// 历史容量
    pub history_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(5000),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// 会话状态快照，所有字段在同一把锁内读取
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    pub session: Option<ActiveSession>,
    pub sample_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

struct SessionState {
    status: ConnectionStatus,
    session: Option<ActiveSession>,
    /// 正在连接的配置 id（查找配置之前即占位）
    connecting_id: Option<String>,
    /// 正在连接的配置（更新配置时同步替换）
    pending: Option<DeviceConfiguration>,
    history: SampleHistory,
    last_updated: Option<DateTime<Utc>>,
    epoch: u64,
    sampler: Option<RepeatingTask>,
}

struct Inner {
    state: Mutex<SessionState>,
    status: watch::Sender<ConnectionStatus>,
    store: Arc<dyn ConfigurationStore>,
    driver: Arc<dyn DeviceDriver>,
    sync: CloudSyncController,
    notifier: Notifier,
    settings: SessionSettings,
}

/// 会话管理器（可克隆句柄），同一时刻至多一个活动会话。
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn ConfigurationStore>,
        driver: Arc<dyn DeviceDriver>,
        sync: CloudSyncController,
        notifier: Notifier,
        settings: SessionSettings,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        let state = SessionState {
            status: ConnectionStatus::Disconnected,
            session: None,
            connecting_id: None,
            pending: None,
            history: SampleHistory::new(settings.history_capacity),
            last_updated: None,
            epoch: 0,
            sampler: None,
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                status,
                store,
                driver,
                sync,
                notifier,
                settings,
            }),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.lock().status
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    pub fn session(&self) -> Option<ActiveSession> {
        self.inner.lock().session.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock();
        SessionSnapshot {
            status: state.status,
            session: state.session.clone(),
            sample_count: state.history.len(),
            last_updated: state.last_updated,
        }
    }

    /// 采样历史（旧 → 新）
    pub fn history(&self) -> Vec<Sample> {
        self.inner.lock().history.to_vec()
    }

    pub fn history_csv(&self) -> Result<String, SessionError> {
        Ok(self.inner.lock().history.to_csv()?)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().last_updated
    }

    pub fn sync(&self) -> &CloudSyncController {
        &self.inner.sync
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    /// 按配置 id 连接。查找配置前先占住连接状态，
    /// 期间删除该配置会取消本次连接。
    pub async fn connect_by_id(&self, id: &str) -> Result<ActiveSession, SessionError> {
        let guard = self.begin_connect(id, None)?;
        let config = self
            .inner
            .store
            .find_configuration(id)
            .await?
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        {
            let mut state = self.inner.lock();
            if state.epoch != guard.epoch {
                return Err(SessionError::Cancelled);
            }
            state.pending = Some(config.clone());
        }
        self.open_session(guard, config).await
    }

    /// 连接设备。失败不重试；连接期间被断开时返回 `Cancelled`。
    pub async fn connect(&self, config: DeviceConfiguration) -> Result<ActiveSession, SessionError> {
        let guard = self.begin_connect(&config.id, Some(config.clone()))?;
        self.open_session(guard, config).await
    }

    fn begin_connect(
        &self,
        id: &str,
        pending: Option<DeviceConfiguration>,
    ) -> Result<ConnectingGuard<'_>, SessionError> {
        let mut state = self.inner.lock();
        if state.status != ConnectionStatus::Disconnected {
            return Err(SessionError::Busy(state.status));
        }
        state.epoch += 1;
        state.connecting_id = Some(id.to_string());
        state.pending = pending;
        self.inner.set_status(&mut state, ConnectionStatus::Connecting);
        Ok(ConnectingGuard {
            inner: &self.inner,
            epoch: state.epoch,
            armed: true,
        })
    }

    async fn open_session(
        &self,
        mut guard: ConnectingGuard<'_>,
        config: DeviceConfiguration,
    ) -> Result<ActiveSession, SessionError> {
        let epoch = guard.epoch;
        record_connect_attempt();
        info!(
            target: "plc.session",
            config_id = %config.id,
            endpoint = %config.endpoint(),
            "connecting"
        );

        let result = self.inner.driver.open(&config).await;
        guard.armed = false;

        let mut state = self.inner.lock();
        if state.epoch != epoch {
            drop(state);
            info!(target: "plc.session", config_id = %config.id, "connect attempt discarded");
            return Err(SessionError::Cancelled);
        }
        state.connecting_id = None;
        let config = state.pending.take().unwrap_or(config);

        match result {
            Ok(link) => {
                let session = ActiveSession {
                    configuration: config,
                    connected_at: Utc::now(),
                };
                state.session = Some(session.clone());
                state.history.clear();
                state.last_updated = None;
                state.sampler = Some(self.start_sampler(epoch, link));
                self.inner.set_status(&mut state, ConnectionStatus::Connected);
                drop(state);

                record_connect_success();
                info!(
                    target: "plc.session",
                    config_id = %session.configuration.id,
                    "connected"
                );
                self.inner.notifier.notify(Notification::info(
                    "Connected to PLC",
                    format!("Successfully connected to {}", session.configuration.name),
                ));
                Ok(session)
            }
            Err(err) => {
                self.inner.set_status(&mut state, ConnectionStatus::Disconnected);
                drop(state);

                record_connect_failure();
                warn!(target: "plc.session", config_id = %config.id, "connect failed: {}", err);
                self.inner.notifier.notify(Notification::error(
                    "Connection Failed",
                    format!("Could not connect to {}", config.name),
                ));
                Err(SessionError::Connection(err))
            }
        }
    }

    /// 断开会话。已断开时不做任何事并返回 false。
    pub fn disconnect(&self) -> bool {
        let mut state = self.inner.lock();
        if state.status == ConnectionStatus::Disconnected {
            return false;
        }
        state.epoch += 1;
        let sampler = state.sampler.take();
        state.session = None;
        state.connecting_id = None;
        state.pending = None;
        state.history.clear();
        state.last_updated = None;
        self.inner.set_status(&mut state, ConnectionStatus::Disconnected);
        drop(state);

        if let Some(sampler) = sampler {
            sampler.cancel();
        }
        info!(target: "plc.session", "disconnected");
        self.inner.notifier.notify(Notification::info(
            "Disconnected",
            "Successfully disconnected from PLC",
        ));
        true
    }

    pub async fn list_configurations(&self) -> Result<Vec<DeviceConfiguration>, SessionError> {
        Ok(self.inner.store.list_configurations().await?)
    }

    pub async fn find_configuration(
        &self,
        id: &str,
    ) -> Result<Option<DeviceConfiguration>, SessionError> {
        Ok(self.inner.store.find_configuration(id).await?)
    }

    /// 新增配置，id 重复时失败
    pub async fn add_configuration(
        &self,
        config: DeviceConfiguration,
    ) -> Result<DeviceConfiguration, SessionError> {
        let created = self.inner.store.create_configuration(config).await?;
        info!(target: "plc.session", config_id = %created.id, "configuration added");
        Ok(created)
    }

    /// 替换配置；若为活动会话的配置，会话内的配置同步替换，下一次采样生效
    pub async fn update_configuration(
        &self,
        config: DeviceConfiguration,
    ) -> Result<DeviceConfiguration, SessionError> {
        let id = config.id.clone();
        let updated = self
            .inner
            .store
            .update_configuration(config)
            .await?
            .ok_or(SessionError::NotFound(id))?;

        let mut state = self.inner.lock();
        if let Some(session) = state.session.as_mut() {
            if session.configuration.id == updated.id {
                session.configuration = updated.clone();
                debug!(target: "plc.session", config_id = %updated.id, "active configuration replaced");
            }
        }
        if let Some(pending) = state.pending.as_mut() {
            if pending.id == updated.id {
                *pending = updated.clone();
            }
        }
        Ok(updated)
    }

    /// 删除配置；若为活动（或正在连接）的配置，先断开会话再删除。
    /// 删除后再检查一次，覆盖删除期间开始的连接。
    pub async fn remove_configuration(&self, id: &str) -> Result<bool, SessionError> {
        if self.inner.uses_configuration(id) {
            self.disconnect();
        }
        let removed = self.inner.store.delete_configuration(id).await?;
        if self.inner.uses_configuration(id) {
            self.disconnect();
        }
        if removed {
            info!(target: "plc.session", config_id = %id, "configuration removed");
        }
        Ok(removed)
    }

    fn start_sampler(&self, epoch: u64, mut link: Box<dyn DeviceLink>) -> RepeatingTask {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        RepeatingTask::spawn(self.inner.settings.tick_interval, move |mut ticker| async move {
            loop {
                ticker.tick().await;
                let read = link.read().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let current = match read {
                    Ok(values) => inner.record_sample(epoch, values),
                    Err(err) => {
                        let current = inner.is_current(epoch);
                        if current {
                            record_sample_read_failure();
                            warn!(target: "plc.session", epoch, "sample read failed: {}", err);
                        }
                        current
                    }
                };
                if !current {
                    break;
                }
            }
        })
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn set_status(&self, state: &mut SessionState, status: ConnectionStatus) {
        state.status = status;
        self.status.send_replace(status);
    }

    /// 活动会话、正在连接或正在查找的配置是否为 `id`
    fn uses_configuration(&self, id: &str) -> bool {
        let state = self.lock();
        state
            .session
            .as_ref()
            .is_some_and(|session| session.configuration.id == id)
            || state.pending.as_ref().is_some_and(|pending| pending.id == id)
            || state.connecting_id.as_deref() == Some(id)
    }

    fn is_current(&self, epoch: u64) -> bool {
        let state = self.lock();
        state.epoch == epoch && state.status == ConnectionStatus::Connected
    }

    /// 追加一条采样并交给云同步；会话已结束时返回 false
    fn record_sample(&self, epoch: u64, values: Vec<RegisterValue>) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch || state.status != ConnectionStatus::Connected {
            return false;
        }
        let Some(config) = state
            .session
            .as_ref()
            .map(|session| session.configuration.clone())
        else {
            return false;
        };
        let sample = Sample::new(Utc::now(), values);
        let evicted = state.history.push(sample.clone());
        state.last_updated = Some(sample.timestamp);
        record_sample_emitted(evicted);
        debug!(
            target: "plc.session",
            config_id = %config.id,
            values = ?sample.values,
            history = state.history.len(),
            "sample recorded"
        );
        self.sync.sync_sample(&config, &sample);
        true
    }
}

/// 连接 future 被丢弃时把 connecting 状态复位
struct ConnectingGuard<'a> {
    inner: &'a Inner,
    epoch: u64,
    armed: bool,
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.inner.lock();
        if state.epoch == self.epoch && state.status == ConnectionStatus::Connecting {
            state.epoch += 1;
            state.connecting_id = None;
            state.pending = None;
            self.inner.set_status(&mut state, ConnectionStatus::Disconnected);
        }
    }
}
