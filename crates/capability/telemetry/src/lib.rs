//! 追踪初始化、请求 ID 与进程级计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 流水线各阶段的计数快照。
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub callbacks_received: u64,
    pub callbacks_rejected: u64,
    pub ids_enqueued: u64,
    pub fetch_success: u64,
    pub fetch_failure: u64,
    pub online_observations: u64,
    pub offline_observations: u64,
    pub upsert_success: u64,
    pub upsert_failure: u64,
    pub delete_success: u64,
    pub delete_failure: u64,
    pub timers_armed: u64,
    pub timers_refreshed: u64,
    pub timers_fired: u64,
    pub reconciled_stale: u64,
    pub reconciled_rearmed: u64,
}

/// 流水线各阶段的进程级计数器。
pub struct TelemetryMetrics {
    callbacks_received: AtomicU64,
    callbacks_rejected: AtomicU64,
    ids_enqueued: AtomicU64,
    fetch_success: AtomicU64,
    fetch_failure: AtomicU64,
    online_observations: AtomicU64,
    offline_observations: AtomicU64,
    upsert_success: AtomicU64,
    upsert_failure: AtomicU64,
    delete_success: AtomicU64,
    delete_failure: AtomicU64,
    timers_armed: AtomicU64,
    timers_refreshed: AtomicU64,
    timers_fired: AtomicU64,
    reconciled_stale: AtomicU64,
    reconciled_rearmed: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            callbacks_received: AtomicU64::new(0),
            callbacks_rejected: AtomicU64::new(0),
            ids_enqueued: AtomicU64::new(0),
            fetch_success: AtomicU64::new(0),
            fetch_failure: AtomicU64::new(0),
            online_observations: AtomicU64::new(0),
            offline_observations: AtomicU64::new(0),
            upsert_success: AtomicU64::new(0),
            upsert_failure: AtomicU64::new(0),
            delete_success: AtomicU64::new(0),
            delete_failure: AtomicU64::new(0),
            timers_armed: AtomicU64::new(0),
            timers_refreshed: AtomicU64::new(0),
            timers_fired: AtomicU64::new(0),
            reconciled_stale: AtomicU64::new(0),
            reconciled_rearmed: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            callbacks_received: self.callbacks_received.load(Ordering::Relaxed),
            callbacks_rejected: self.callbacks_rejected.load(Ordering::Relaxed),
            ids_enqueued: self.ids_enqueued.load(Ordering::Relaxed),
            fetch_success: self.fetch_success.load(Ordering::Relaxed),
            fetch_failure: self.fetch_failure.load(Ordering::Relaxed),
            online_observations: self.online_observations.load(Ordering::Relaxed),
            offline_observations: self.offline_observations.load(Ordering::Relaxed),
            upsert_success: self.upsert_success.load(Ordering::Relaxed),
            upsert_failure: self.upsert_failure.load(Ordering::Relaxed),
            delete_success: self.delete_success.load(Ordering::Relaxed),
            delete_failure: self.delete_failure.load(Ordering::Relaxed),
            timers_armed: self.timers_armed.load(Ordering::Relaxed),
            timers_refreshed: self.timers_refreshed.load(Ordering::Relaxed),
            timers_fired: self.timers_fired.load(Ordering::Relaxed),
            reconciled_stale: self.reconciled_stale.load(Ordering::Relaxed),
            reconciled_rearmed: self.reconciled_rearmed.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing。生产环境默认 info，开发环境默认 debug；
/// RUST_LOG 存在时以其为准。
pub fn init_tracing(is_production: bool) {
    let default_level = if is_production { "info" } else { "debug" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录接受的回调次数。
pub fn record_callback_received() {
    metrics().callbacks_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录解码失败被拒绝的回调次数。
pub fn record_callback_rejected() {
    metrics().callbacks_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录进入输入队列的标识数。
pub fn record_id_enqueued() {
    metrics().ids_enqueued.fetch_add(1, Ordering::Relaxed);
}

/// 记录 tester 查询成功次数。
pub fn record_fetch_success() {
    metrics().fetch_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录 tester 查询失败次数（标识被丢弃）。
pub fn record_fetch_failure() {
    metrics().fetch_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录 online 观测次数。
pub fn record_online_observation() {
    metrics().online_observations.fetch_add(1, Ordering::Relaxed);
}

/// 记录 offline 观测次数。
pub fn record_offline_observation() {
    metrics()
        .offline_observations
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录落库成功次数。
pub fn record_upsert_success() {
    metrics().upsert_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录落库失败次数。
pub fn record_upsert_failure() {
    metrics().upsert_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录删除成功次数。
pub fn record_delete_success() {
    metrics().delete_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录删除失败次数。
pub fn record_delete_failure() {
    metrics().delete_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录新装定时器次数。
pub fn record_timer_armed() {
    metrics().timers_armed.fetch_add(1, Ordering::Relaxed);
}

/// 记录定时器刷新次数。
pub fn record_timer_refreshed() {
    metrics().timers_refreshed.fetch_add(1, Ordering::Relaxed);
}

/// 记录定时器到期触发次数。
pub fn record_timer_fired() {
    metrics().timers_fired.fetch_add(1, Ordering::Relaxed);
}

/// 记录冷启动时已过期直接删除的记录数。
pub fn record_reconciled_stale() {
    metrics().reconciled_stale.fetch_add(1, Ordering::Relaxed);
}

/// 记录冷启动时按剩余窗口重新装定时器的记录数。
pub fn record_reconciled_rearmed() {
    metrics().reconciled_rearmed.fetch_add(1, Ordering::Relaxed);
}
