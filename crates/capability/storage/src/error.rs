//! 存储层错误类型
//!
//! 定义统一的存储错误类型，用于封装底层错误：
//! - 数据一致性错误（重复 ID）
//! - 配置字段校验失败
//! - 导出编码错误

/// 重复 ID 时的错误信息
pub const DUPLICATE_CONFIGURATION: &str = "configuration exists";

#[derive(Debug)]
pub struct StorageError {
    message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn duplicate() -> Self {
        Self::new(DUPLICATE_CONFIGURATION)
    }

    /// 是否为重复 ID 冲突
    pub fn is_duplicate(&self) -> bool {
        self.message == DUPLICATE_CONFIGURATION
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

impl From<csv::Error> for StorageError {
    fn from(err: csv::Error) -> Self {
        Self::new(err.to_string())
    }
}
