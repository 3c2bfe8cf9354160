//! 协议错误类型定义

/// 设备通信错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 连接错误（设备不可达、模拟连接失败）
    #[error("connection error: {0}")]
    Connection(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Modbus 错误
    #[error("modbus error: {0}")]
    Modbus(String),

    /// 配置解析错误
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// 驱动不支持该传输方式
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// 超时错误
    #[error("timeout: {0}")]
    Timeout(String),
}
