//! 会话错误类型定义

use domain::ConnectionStatus;
use plc_protocol::ProtocolError;
use plc_storage::StorageError;

/// 会话操作错误
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// 已有会话正在连接或已连接
    #[error("session busy: {0}")]
    Busy(ConnectionStatus),

    /// 连接过程中被断开或配置被删除，结果已丢弃
    #[error("connect attempt cancelled")]
    Cancelled,

    #[error("connection failed: {0}")]
    Connection(#[from] ProtocolError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration not found: {0}")]
    NotFound(String),
}
