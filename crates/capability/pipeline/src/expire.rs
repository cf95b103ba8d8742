//! 逐出定时器注册表。
//!
//! 每个标识至多持有一个定时器。刷新即中止旧的触发任务并以完整保留窗口
//! 重新装定；触发路径先在注册表锁内摘除自身条目、再入队删除，保证下游
//! 永远看不到"已触发但仍在表里"的条目。

use chrono::{DateTime, Utc};
use presence_storage::ObjectRecord;
use presence_telemetry::{record_timer_armed, record_timer_fired, record_timer_refreshed};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

pub(crate) struct TimerRegistry {
    timers: Mutex<HashMap<i64, JoinHandle<()>>>,
}

impl TimerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// 当前装定的定时器数量。
    pub(crate) async fn len(&self) -> usize {
        self.timers.lock().await.len()
    }

    /// 处理一次到期队列上的观测：无定时器则装定，已有则刷新。
    pub(crate) async fn observe(
        registry: &Arc<TimerRegistry>,
        record: ObjectRecord,
        retention: Duration,
        delete_tx: &mpsc::Sender<i64>,
    ) {
        let now = Utc::now();
        let mut timers = registry.timers.lock().await;
        match timers.entry(record.id) {
            Entry::Occupied(mut entry) => {
                // 中止后的旧任务停在 sleep 或锁等待上，不可能再入队删除。
                entry.get().abort();
                entry.insert(Self::spawn_fire(registry, record.id, retention, delete_tx.clone()));
                record_timer_refreshed();
                debug!(target: "presence.expire", id = record.id, "timer_refreshed");
            }
            Entry::Vacant(entry) => {
                let horizon = horizon_for(record.last_seen_at, retention, now);
                entry.insert(Self::spawn_fire(registry, record.id, horizon, delete_tx.clone()));
                record_timer_armed();
                debug!(
                    target: "presence.expire",
                    id = record.id,
                    horizon_ms = horizon.as_millis() as u64,
                    "timer_armed"
                );
            }
        }
    }

    fn spawn_fire(
        registry: &Arc<TimerRegistry>,
        id: i64,
        horizon: Duration,
        delete_tx: mpsc::Sender<i64>,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(registry);
        tokio::spawn(async move {
            tokio::time::sleep(horizon).await;
            let mut timers = registry.timers.lock().await;
            timers.remove(&id);
            record_timer_fired();
            debug!(target: "presence.expire", id, "timer_fired");
            if delete_tx.send(id).await.is_err() {
                debug!(target: "presence.expire", id, "delete_queue_closed");
            }
        })
    }
}

/// 装定时限：`last_seen_at` 距今不足一个保留窗口时取剩余部分（冷启动
/// 记录），否则取完整窗口。
fn horizon_for(
    last_seen_at: Option<DateTime<Utc>>,
    retention: Duration,
    now: DateTime<Utc>,
) -> Duration {
    let Some(seen) = last_seen_at else {
        return retention;
    };
    let age = now.signed_duration_since(seen).to_std().unwrap_or_default();
    if age < retention { retention - age } else { retention }
}

pub(crate) async fn run_expiration(
    mut expire_rx: mpsc::Receiver<ObjectRecord>,
    registry: Arc<TimerRegistry>,
    delete_tx: mpsc::Sender<i64>,
    retention: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            record = expire_rx.recv() => {
                let Some(record) = record else { break };
                TimerRegistry::observe(&registry, record, retention, &delete_tx).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn horizon_is_full_window_without_last_seen_at() {
        let now = Utc::now();
        assert_eq!(
            horizon_for(None, Duration::from_secs(30), now),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn horizon_is_residual_for_recent_record() {
        let now = Utc::now();
        let seen = now - ChronoDuration::seconds(10);
        assert_eq!(
            horizon_for(Some(seen), Duration::from_secs(30), now),
            Duration::from_secs(20)
        );
    }

    #[test]
    fn horizon_is_full_window_for_stale_record() {
        let now = Utc::now();
        let seen = now - ChronoDuration::seconds(45);
        assert_eq!(
            horizon_for(Some(seen), Duration::from_secs(30), now),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn horizon_tolerates_future_last_seen_at() {
        let now = Utc::now();
        let seen = now + ChronoDuration::seconds(5);
        assert_eq!(
            horizon_for(Some(seen), Duration::from_secs(30), now),
            Duration::from_secs(30)
        );
    }
}
