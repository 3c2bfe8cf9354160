//! 追踪、请求 ID、运行指标与用户通知通道。

use domain::{Notification, NotificationLevel};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub connect_attempts: u64,
    pub connect_success: u64,
    pub connect_failure: u64,
    pub samples_emitted: u64,
    pub samples_evicted: u64,
    pub sample_read_failure: u64,
    pub sync_attempts: u64,
    pub sync_success: u64,
    pub sync_failure: u64,
    pub sync_unavailable: u64,
}

/// 基础指标。
pub struct TelemetryMetrics {
    connect_attempts: AtomicU64,
    connect_success: AtomicU64,
    connect_failure: AtomicU64,
    samples_emitted: AtomicU64,
    samples_evicted: AtomicU64,
    sample_read_failure: AtomicU64,
    sync_attempts: AtomicU64,
    sync_success: AtomicU64,
    sync_failure: AtomicU64,
    sync_unavailable: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            connect_attempts: AtomicU64::new(0),
            connect_success: AtomicU64::new(0),
            connect_failure: AtomicU64::new(0),
            samples_emitted: AtomicU64::new(0),
            samples_evicted: AtomicU64::new(0),
            sample_read_failure: AtomicU64::new(0),
            sync_attempts: AtomicU64::new(0),
            sync_success: AtomicU64::new(0),
            sync_failure: AtomicU64::new(0),
            sync_unavailable: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connect_success: self.connect_success.load(Ordering::Relaxed),
            connect_failure: self.connect_failure.load(Ordering::Relaxed),
            samples_emitted: self.samples_emitted.load(Ordering::Relaxed),
            samples_evicted: self.samples_evicted.load(Ordering::Relaxed),
            sample_read_failure: self.sample_read_failure.load(Ordering::Relaxed),
            sync_attempts: self.sync_attempts.load(Ordering::Relaxed),
            sync_success: self.sync_success.load(Ordering::Relaxed),
            sync_failure: self.sync_failure.load(Ordering::Relaxed),
            sync_unavailable: self.sync_unavailable.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录连接尝试次数。
pub fn record_connect_attempt() {
    metrics().connect_attempts.fetch_add(1, Ordering::Relaxed);
}

/// 记录连接成功次数。
pub fn record_connect_success() {
    metrics().connect_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录连接失败次数。
pub fn record_connect_failure() {
    metrics().connect_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录采样次数及被挤出历史的条数。
pub fn record_sample_emitted(evicted: usize) {
    let metrics = metrics();
    metrics.samples_emitted.fetch_add(1, Ordering::Relaxed);
    metrics
        .samples_evicted
        .fetch_add(evicted as u64, Ordering::Relaxed);
}

/// 记录设备读取失败次数。
pub fn record_sample_read_failure() {
    metrics().sample_read_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录同步尝试次数。
pub fn record_sync_attempt() {
    metrics().sync_attempts.fetch_add(1, Ordering::Relaxed);
}

/// 记录同步成功次数。
pub fn record_sync_success() {
    metrics().sync_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录同步失败次数（后端写入失败）。
pub fn record_sync_failure() {
    metrics().sync_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录同步后端不可用次数。
pub fn record_sync_unavailable() {
    metrics().sync_unavailable.fetch_add(1, Ordering::Relaxed);
}

/// 用户通知通道（广播）。
///
/// 没有订阅者时发送会被丢弃，通知仍会写入日志。
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => info!(
                target: "plc.notify",
                title = %notification.title,
                "{}",
                notification.description
            ),
            NotificationLevel::Error => warn!(
                target: "plc.notify",
                title = %notification.title,
                "{}",
                notification.description
            ),
        }
        let _ = self.sender.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}
