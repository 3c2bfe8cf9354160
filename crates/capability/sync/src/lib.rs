//! # 云同步能力模块
//!
//! 每条新采样按设备配置的同步策略投递到外部键路径存储，并对外暴露同步状态。
//!
//! ## 架构设计
//!
//! ```text
//! Sample ──► CloudSyncController::sync_sample
//!                 │  (idle -> syncing -> synced/failed -> idle)
//!                 ▼
//!          BackendRegistry[provider]
//!                 │
//!                 ├── FirebaseBackend      (REST)
//!                 └── InMemorySyncBackend  (无原生客户端 / 测试)
//! ```
//!
//! ## 路径约定
//!
//! - `plc-data/{configId}/{autoId}`：采样
//! - `plc-configurations/{configId}`：设备配置

mod backend;
mod controller;
mod error;
mod firebase;
mod in_memory;

pub use backend::{
    BackendRegistry, CONFIGURATION_ROOT, DATA_ROOT, Subscription, SyncBackend,
    configuration_path, data_path, value_set,
};
pub use controller::{CloudSyncController, SyncDispatch, SyncTimings};
pub use error::SyncError;
pub use firebase::{FirebaseBackend, FirebaseCredentials, node_url};
pub use in_memory::InMemorySyncBackend;
