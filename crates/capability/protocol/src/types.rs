//! 协议相关类型定义

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Modbus 读取方式（对应功能码 0x01-0x04）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModbusReadKind {
    /// 读线圈状态 (0x01)
    #[default]
    Coils,
    /// 读离散输入 (0x02)
    DiscreteInputs,
    /// 读保持寄存器 (0x03)
    HoldingRegisters,
    /// 读输入寄存器 (0x04)
    InputRegisters,
}

impl ModbusReadKind {
    pub fn function_code(&self) -> u8 {
        match self {
            Self::Coils => 1,
            Self::DiscreteInputs => 2,
            Self::HoldingRegisters => 3,
            Self::InputRegisters => 4,
        }
    }

    /// 单次请求允许读取的最大数量（线圈 2000，寄存器 125）
    pub fn max_count(&self) -> u16 {
        match self {
            Self::Coils | Self::DiscreteInputs => 2000,
            Self::HoldingRegisters | Self::InputRegisters => 125,
        }
    }
}

impl FromStr for ModbusReadKind {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "coils" | "1" => Ok(Self::Coils),
            "discrete_inputs" | "2" => Ok(Self::DiscreteInputs),
            "holding_registers" | "3" => Ok(Self::HoldingRegisters),
            "input_registers" | "4" => Ok(Self::InputRegisters),
            _ => Err(ProtocolError::ConfigParse(format!(
                "unsupported read kind: {}",
                value
            ))),
        }
    }
}

/// 常见串口波特率
pub const STANDARD_BAUD_RATES: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];
