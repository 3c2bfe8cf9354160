//! # PLC Storage 模块
//!
//! 提供设备配置存储抽象与采样历史缓冲。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：设备配置存储的异步 Trait 接口
//! 2. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 3. **验证辅助层** (`validation.rs`)：设备配置字段校验
//! 4. **历史缓冲** (`history.rs`)：定长采样历史（FIFO 淘汰）与 CSV 导出
//! 5. **实现层**：`in_memory/` 内存存储实现
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use plc_storage::{ConfigurationStore, InMemoryConfigurationStore};
//!
//! // 创建带默认两台 PLC 的存储
//! let store = InMemoryConfigurationStore::with_defaults();
//! let items = store.list_configurations().await?;
//! ```
//!
//! ## 设计约束
//!
//! - 配置仅保存在内存中，进程重启后丢失
//! - 存储本身不校验字段一致性，校验在 API 边界调用 `ensure_valid_configuration`
//! - 会话相关的级联（删除活动配置先断开）由 session 模块负责

pub mod error;
pub mod history;
pub mod in_memory;
pub mod traits;
pub mod validation;

pub use error::*;
pub use history::*;
pub use traits::*;
pub use validation::*;

pub use in_memory::{InMemoryConfigurationStore, default_configurations};
