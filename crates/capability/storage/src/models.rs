//! 存储数据模型。

use chrono::{DateTime, Utc};

/// 持久化的对象记录。
///
/// tester 观测到的 `online` 标志只活在内存里，永不落库。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub id: i64,
    pub last_seen_at: Option<DateTime<Utc>>,
}
