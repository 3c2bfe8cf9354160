//! 同步错误类型定义

/// 云同步错误
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// 后端缺失或凭据未配置，未尝试投递
    #[error("sync unavailable: {0}")]
    Unavailable(String),

    /// 投递失败（网络错误、后端拒绝）
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// 读取失败
    #[error("read failed: {0}")]
    Read(String),

    /// 数据序列化错误
    #[error("payload error: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}
