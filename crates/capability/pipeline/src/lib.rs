//! 在线对象流水线。
//!
//! 回调入口与持久化存储之间的并发引擎：四条有界队列串起五个长驻阶段
//! （输入 → 状态查询 → upsert / 到期管理 → delete），外加一次性的冷启动
//! 对账。队列容量即 `MAX_OBJECTS_PER_REQUEST`，写满时生产者阻塞，构成
//! 天然背压。
//!
//! 关停顺序：广播信号 → 各阶段退出 select 循环 → 查询阶段等完在途任务
//! 后才丢弃下游发送端 → 监督者等全部阶段收尾。未触发的定时器随进程
//! 一起丢弃，由下次冷启动对账接管。

mod expire;

use chrono::Utc;
use expire::{TimerRegistry, run_expiration};
use presence_probe::StatusClient;
use presence_storage::{ObjectRecord, ObjectStore};
use presence_telemetry::{
    record_delete_failure, record_delete_success, record_fetch_failure, record_fetch_success,
    record_offline_observation, record_online_observation, record_reconciled_rearmed,
    record_reconciled_stale, record_upsert_failure, record_upsert_success,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

/// 流水线参数。
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 四条队列的统一容量（MAX_OBJECTS_PER_REQUEST）。
    pub queue_capacity: usize,
    /// 未再次确认在线的对象被逐出前的保留窗口。
    pub retention: Duration,
    /// 对 tester 的并发查询上限。
    pub fetch_concurrency: usize,
}

impl PipelineConfig {
    fn sanitized(mut self) -> Self {
        if self.queue_capacity == 0 {
            self.queue_capacity = 1;
        }
        if self.fetch_concurrency == 0 {
            self.fetch_concurrency = 1;
        }
        self
    }
}

/// 流水线句柄：持有输入队列发送端与各阶段的任务句柄。
pub struct Pipeline {
    input_tx: mpsc::Sender<i64>,
    expire_tx: mpsc::Sender<ObjectRecord>,
    delete_tx: mpsc::Sender<i64>,
    shutdown_tx: broadcast::Sender<()>,
    workers: Vec<JoinHandle<()>>,
    registry: Arc<TimerRegistry>,
    store: Arc<dyn ObjectStore>,
    retention: Duration,
}

impl Pipeline {
    /// 创建队列并启动全部长驻阶段。
    pub fn spawn(
        config: PipelineConfig,
        store: Arc<dyn ObjectStore>,
        client: Arc<dyn StatusClient>,
    ) -> Self {
        let config = config.sanitized();
        let (input_tx, input_rx) = mpsc::channel::<i64>(config.queue_capacity);
        let (upsert_tx, upsert_rx) = mpsc::channel::<ObjectRecord>(config.queue_capacity);
        let (expire_tx, expire_rx) = mpsc::channel::<ObjectRecord>(config.queue_capacity);
        let (delete_tx, delete_rx) = mpsc::channel::<i64>(config.queue_capacity);
        let (shutdown_tx, _) = broadcast::channel(1);
        let registry = Arc::new(TimerRegistry::new());

        let workers = vec![
            tokio::spawn(run_fetcher(
                input_rx,
                client,
                upsert_tx,
                expire_tx.clone(),
                delete_tx.clone(),
                config.fetch_concurrency,
                shutdown_tx.subscribe(),
            )),
            tokio::spawn(run_upserter(
                upsert_rx,
                store.clone(),
                shutdown_tx.subscribe(),
            )),
            tokio::spawn(run_expiration(
                expire_rx,
                registry.clone(),
                delete_tx.clone(),
                config.retention,
                shutdown_tx.subscribe(),
            )),
            tokio::spawn(run_deleter(
                delete_rx,
                store.clone(),
                shutdown_tx.subscribe(),
            )),
        ];

        Self {
            input_tx,
            expire_tx,
            delete_tx,
            shutdown_tx,
            workers,
            registry,
            store,
            retention: config.retention,
        }
    }

    /// 输入队列的发送端，交给回调入口使用。
    pub fn input(&self) -> mpsc::Sender<i64> {
        self.input_tx.clone()
    }

    /// 当前装定的逐出定时器数量。
    pub async fn armed_timers(&self) -> usize {
        self.registry.len().await
    }

    /// 冷启动对账，进程生命周期内只跑一次：已超期的记录直接入删除
    /// 队列，其余按剩余窗口重新装定定时器。扫描失败只记日志，系统在
    /// 没有预置定时器的状态下继续运行。
    pub async fn reconcile(&self) {
        let records = match self.store.list_objects().await {
            Ok(records) => records,
            Err(err) => {
                error!(target: "presence.pipeline", error = %err, "cold_start_scan_failed");
                return;
            }
        };

        let now = Utc::now();
        let scanned = records.len();
        let mut stale = 0usize;
        for record in records {
            let expired = record
                .last_seen_at
                .map(|seen| now.signed_duration_since(seen).to_std().unwrap_or_default())
                .map(|age| age > self.retention)
                .unwrap_or(false);
            if expired {
                stale += 1;
                record_reconciled_stale();
                if self.delete_tx.send(record.id).await.is_err() {
                    break;
                }
            } else {
                record_reconciled_rearmed();
                if self.expire_tx.send(record).await.is_err() {
                    break;
                }
            }
        }
        info!(
            target: "presence.pipeline",
            scanned,
            stale,
            rearmed = scanned - stale,
            "cold_start_reconciled"
        );
    }

    /// 广播关停信号并等全部阶段收尾。
    pub async fn shutdown(mut self) {
        debug!(target: "presence.pipeline", "pipeline_shutdown_started");
        let _ = self.shutdown_tx.send(());
        for worker in self.workers.drain(..) {
            let _ = worker.await;
        }
        info!(target: "presence.pipeline", "pipeline_shutdown_complete");
    }
}

/// 状态查询阶段：逐个取出标识，在并发上限内为每个标识派生独立查询
/// 任务，慢响应不会串行化吞吐。
async fn run_fetcher(
    mut input_rx: mpsc::Receiver<i64>,
    client: Arc<dyn StatusClient>,
    upsert_tx: mpsc::Sender<ObjectRecord>,
    expire_tx: mpsc::Sender<ObjectRecord>,
    delete_tx: mpsc::Sender<i64>,
    concurrency: usize,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut inflight = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            Some(_) = inflight.join_next(), if !inflight.is_empty() => {}
            id = input_rx.recv() => {
                let Some(id) = id else { break };
                let permit = tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    permit = semaphore.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };
                let client = client.clone();
                let upsert_tx = upsert_tx.clone();
                let expire_tx = expire_tx.clone();
                let delete_tx = delete_tx.clone();
                inflight.spawn(async move {
                    let _permit = permit;
                    fetch_one(id, client.as_ref(), upsert_tx, expire_tx, delete_tx).await;
                });
            }
        }
    }
    // 先等在途查询收尾，下游发送端随本阶段返回一起释放。
    while inflight.join_next().await.is_some() {}
}

async fn fetch_one(
    id: i64,
    client: &dyn StatusClient,
    upsert_tx: mpsc::Sender<ObjectRecord>,
    expire_tx: mpsc::Sender<ObjectRecord>,
    delete_tx: mpsc::Sender<i64>,
) {
    debug!(target: "presence.fetch", id, "status_fetch_started");
    match client.fetch_status(id).await {
        Ok(status) => {
            record_fetch_success();
            debug!(
                target: "presence.fetch",
                id = status.id,
                online = status.online,
                "status_fetched"
            );
            if status.online {
                record_online_observation();
                // 响应体里的 id 为准；last_seen_at 取服务端本地时间。
                let record = ObjectRecord {
                    id: status.id,
                    last_seen_at: Some(Utc::now()),
                };
                if upsert_tx.send(record.clone()).await.is_err() {
                    return;
                }
                let _ = expire_tx.send(record).await;
            } else {
                record_offline_observation();
                let _ = delete_tx.send(status.id).await;
            }
        }
        Err(err) => {
            // 查询失败等同"无信息"：丢弃标识，已有定时器继续倒计时。
            record_fetch_failure();
            error!(target: "presence.fetch", id, error = %err, "status_fetch_failed");
        }
    }
}

/// upsert 阶段：每条记录独立任务落库，吸收存储延迟。失败只记日志。
async fn run_upserter(
    mut upsert_rx: mpsc::Receiver<ObjectRecord>,
    store: Arc<dyn ObjectStore>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut tasks = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            record = upsert_rx.recv() => {
                let Some(record) = record else { break };
                let store = store.clone();
                tasks.spawn(async move {
                    match store.upsert_object(&record).await {
                        Ok(()) => {
                            record_upsert_success();
                            debug!(target: "presence.store", id = record.id, "object_upserted");
                        }
                        Err(err) => {
                            record_upsert_failure();
                            error!(
                                target: "presence.store",
                                id = record.id,
                                error = %err,
                                "object_upsert_failed"
                            );
                        }
                    }
                });
            }
        }
    }
    while tasks.join_next().await.is_some() {}
}

/// delete 阶段：每个标识独立任务删除。删除不存在的标识不是错误。
async fn run_deleter(
    mut delete_rx: mpsc::Receiver<i64>,
    store: Arc<dyn ObjectStore>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut tasks = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            id = delete_rx.recv() => {
                let Some(id) = id else { break };
                let store = store.clone();
                tasks.spawn(async move {
                    match store.delete_object(id).await {
                        Ok(()) => {
                            record_delete_success();
                            debug!(target: "presence.store", id, "object_deleted");
                        }
                        Err(err) => {
                            record_delete_failure();
                            error!(
                                target: "presence.store",
                                id,
                                error = %err,
                                "object_delete_failed"
                            );
                        }
                    }
                });
            }
        }
    }
    while tasks.join_next().await.is_some() {}
}
