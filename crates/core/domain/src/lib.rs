use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tester 返回的对象状态。
///
/// `online` 只存在于内存中的观测结果，不落库；`last_seen_at` 以响应体携带的
/// 值解码，但服务端在 online 观测时会用本地 UTC 时间覆盖。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStatus {
    pub id: i64,
    pub online: bool,
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// 回调载荷：tester 推送的一批对象标识。
///
/// 允许重复，顺序无意义。缺失 `object_ids` 键按空批次解码，
/// 不视为协议错误。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackBatch {
    #[serde(default)]
    pub object_ids: Vec<i64>,
}
