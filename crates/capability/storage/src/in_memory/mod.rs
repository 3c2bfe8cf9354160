//! 内存存储实现模块
//!
//! 配置仅保存在进程内存中，重启后丢失。
//!
//! 包含以下实现：
//! - ConfigurationStore: InMemoryConfigurationStore

pub mod configuration;

pub use configuration::*;
