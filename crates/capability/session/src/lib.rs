//! # 会话能力模块
//!
//! 管理唯一的设备会话：连接状态机、采样循环、历史缓冲与云同步触发。
//!
//! ## 架构设计
//!
//! ```text
//! connect ──► DeviceDriver::open ──► RepeatingTask (每个采样周期)
//!                                        │ DeviceLink::read
//!                                        ▼
//!                              record_sample (epoch 校验)
//!                                ├── SampleHistory::push
//!                                └── CloudSyncController::sync_sample
//! ```

mod error;
mod manager;
mod scheduler;

pub use error::SessionError;
pub use manager::{SessionManager, SessionSettings, SessionSnapshot};
pub use scheduler::RepeatingTask;
