//! # 设备驱动能力模块
//!
//! 提供 PLC 连接与数据读取能力，支持：
//! - **模拟驱动**：固定延迟 + 随机结果，随机源可注入（测试用确定性替身）
//! - **Modbus TCP**：基于 tokio-modbus 读取线圈 / 寄存器
//!
//! ## 架构设计
//!
//! ```text
//! DeviceConfiguration
//!       │
//!       ▼
//! DeviceDriver::open ──► DeviceLink
//!       │                    │
//!       ├── SimulatedDriver  └── read() 每个采样周期一次
//!       └── ModbusTcpDriver
//! ```
//!
//! ## 配置格式
//!
//! ### Modbus TCP
//! ```json
//! { "read_kind": "coils", "connect_timeout_ms": 5000, "read_timeout_ms": 3000 }
//! ```

mod driver;
mod error;
mod modbus_tcp;
mod simulated;
mod types;

pub use driver::{DeviceDriver, DeviceLink};
pub use error::ProtocolError;
pub use modbus_tcp::{ModbusTcpConfig, ModbusTcpDriver};
pub use simulated::{
    FixedOutcome, IMPLAUSIBLE_PENALTY, OutcomeProvider, RandomOutcomes, ScriptedOutcomes,
    SimulatedDriver, SimulatedSettings, transport_is_plausible,
};
pub use types::*;
