//! 存储层错误类型
//!
//! 对象注册表的存储失败只有两个来源：SQL 执行（连接、查询）与内存实现
//! 的锁中毒。统一折叠为一个携带操作名的轻量错误，方便流水线按条目记
//! 日志后继续运行。

#[derive(Debug)]
pub struct StorageError {
    op: &'static str,
    detail: String,
}

impl StorageError {
    pub fn new(op: &'static str, detail: impl Into<String>) -> Self {
        Self {
            op,
            detail: detail.into(),
        }
    }

    /// 内存实现专用：RwLock 中毒。
    pub(crate) fn lock_poisoned(op: &'static str) -> Self {
        Self::new(op, "lock poisoned")
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.op, self.detail)
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::new("sql", err.to_string())
    }
}
