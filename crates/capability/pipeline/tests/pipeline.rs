use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use domain::ObjectStatus;
use presence_pipeline::{Pipeline, PipelineConfig};
use presence_probe::{ProbeError, StatusClient};
use presence_storage::{InMemoryObjectStore, ObjectRecord, ObjectStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// 固定脚本客户端：集合内的标识在线，其余离线。
struct ScriptedClient {
    online_ids: HashSet<i64>,
}

impl ScriptedClient {
    fn online(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            online_ids: ids.into_iter().collect(),
        }
    }
}

#[async_trait]
impl StatusClient for ScriptedClient {
    async fn fetch_status(&self, id: i64) -> Result<ObjectStatus, ProbeError> {
        Ok(ObjectStatus {
            id,
            online: self.online_ids.contains(&id),
            last_seen_at: None,
        })
    }
}

/// 全部请求失败的客户端。
struct FailingClient;

#[async_trait]
impl StatusClient for FailingClient {
    async fn fetch_status(&self, _id: i64) -> Result<ObjectStatus, ProbeError> {
        Err(ProbeError::Transport("connection refused".to_string()))
    }
}

/// 响应体返回与请求不同 id 的客户端。
struct RemappingClient {
    offset: i64,
}

#[async_trait]
impl StatusClient for RemappingClient {
    async fn fetch_status(&self, id: i64) -> Result<ObjectStatus, ProbeError> {
        Ok(ObjectStatus {
            id: id + self.offset,
            online: true,
            last_seen_at: None,
        })
    }
}

fn config(retention: Duration) -> PipelineConfig {
    PipelineConfig {
        queue_capacity: 16,
        retention,
        fetch_concurrency: 16,
    }
}

async fn stored_ids(store: &InMemoryObjectStore) -> Vec<i64> {
    let mut ids: Vec<i64> = store
        .list_objects()
        .await
        .expect("list")
        .iter()
        .map(|record| record.id)
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn online_object_is_persisted_then_evicted() {
    let store = Arc::new(InMemoryObjectStore::new());
    let pipeline = Pipeline::spawn(
        config(Duration::from_millis(300)),
        store.clone(),
        Arc::new(ScriptedClient::online([7])),
    );

    pipeline.input().send(7).await.expect("enqueue");

    tokio::time::sleep(Duration::from_millis(100)).await;
    let records = store.list_objects().await.expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 7);
    assert!(records[0].last_seen_at.is_some());
    assert_eq!(pipeline.armed_timers().await, 1);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(stored_ids(&store).await.is_empty());
    assert_eq!(pipeline.armed_timers().await, 0);
}

#[tokio::test]
async fn repeated_observation_refreshes_retention() {
    let store = Arc::new(InMemoryObjectStore::new());
    let pipeline = Pipeline::spawn(
        config(Duration::from_millis(600)),
        store.clone(),
        Arc::new(ScriptedClient::online([7])),
    );

    pipeline.input().send(7).await.expect("enqueue");
    tokio::time::sleep(Duration::from_millis(300)).await;
    pipeline.input().send(7).await.expect("refresh enqueue");

    // 原始窗口在 ~600ms 到期；刷新把时限推到 ~900ms。
    tokio::time::sleep(Duration::from_millis(450)).await;
    assert_eq!(stored_ids(&store).await, vec![7]);

    tokio::time::sleep(Duration::from_millis(450)).await;
    assert!(stored_ids(&store).await.is_empty());
}

#[tokio::test]
async fn offline_observation_evicts_immediately() {
    let store = Arc::new(InMemoryObjectStore::with_records([ObjectRecord {
        id: 9,
        last_seen_at: Some(Utc::now()),
    }]));
    let pipeline = Pipeline::spawn(
        config(Duration::from_secs(30)),
        store.clone(),
        Arc::new(ScriptedClient::online([])),
    );

    pipeline.input().send(9).await.expect("enqueue");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(stored_ids(&store).await.is_empty());
    assert_eq!(pipeline.armed_timers().await, 0);
}

#[tokio::test]
async fn mixed_batch_keeps_online_and_drops_offline() {
    let store = Arc::new(InMemoryObjectStore::new());
    let pipeline = Pipeline::spawn(
        config(Duration::from_secs(30)),
        store.clone(),
        Arc::new(ScriptedClient::online([1, 3, 5])),
    );

    let input = pipeline.input();
    for id in 1..=5 {
        input.send(id).await.expect("enqueue");
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(stored_ids(&store).await, vec![1, 3, 5]);
    assert_eq!(pipeline.armed_timers().await, 3);
}

#[tokio::test]
async fn cold_start_deletes_stale_and_rearms_fresh() {
    let now = Utc::now();
    let store = Arc::new(InMemoryObjectStore::with_records([
        ObjectRecord {
            id: 10,
            last_seen_at: Some(now - ChronoDuration::milliseconds(600)),
        },
        ObjectRecord {
            id: 11,
            last_seen_at: Some(now - ChronoDuration::milliseconds(150)),
        },
    ]));
    let pipeline = Pipeline::spawn(
        config(Duration::from_millis(300)),
        store.clone(),
        Arc::new(ScriptedClient::online([])),
    );

    pipeline.reconcile().await;

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(stored_ids(&store).await, vec![11]);
    assert_eq!(pipeline.armed_timers().await, 1);

    // 11 的剩余窗口约 150ms，随后被逐出。
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(stored_ids(&store).await.is_empty());
    assert_eq!(pipeline.armed_timers().await, 0);
}

#[tokio::test]
async fn fetch_failure_drops_identifier_silently() {
    let store = Arc::new(InMemoryObjectStore::with_records([ObjectRecord {
        id: 4,
        last_seen_at: Some(Utc::now()),
    }]));
    let pipeline = Pipeline::spawn(
        config(Duration::from_millis(300)),
        store.clone(),
        Arc::new(FailingClient),
    );

    pipeline.input().send(4).await.expect("enqueue");

    // 失败观测不产生删除，也不装定时器：记录原样保留。
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(stored_ids(&store).await, vec![4]);
    assert_eq!(pipeline.armed_timers().await, 0);
}

#[tokio::test]
async fn body_id_is_authoritative() {
    let store = Arc::new(InMemoryObjectStore::new());
    let pipeline = Pipeline::spawn(
        config(Duration::from_secs(30)),
        store.clone(),
        Arc::new(RemappingClient { offset: 1000 }),
    );

    pipeline.input().send(7).await.expect("enqueue");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(stored_ids(&store).await, vec![1007]);
}

#[tokio::test]
async fn duplicate_ids_share_a_single_timer() {
    let store = Arc::new(InMemoryObjectStore::new());
    let pipeline = Pipeline::spawn(
        config(Duration::from_secs(30)),
        store.clone(),
        Arc::new(ScriptedClient::online([5])),
    );

    let input = pipeline.input();
    for _ in 0..3 {
        input.send(5).await.expect("enqueue");
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(stored_ids(&store).await, vec![5]);
    assert_eq!(pipeline.armed_timers().await, 1);
}

#[tokio::test]
async fn shutdown_joins_all_workers() {
    let store = Arc::new(InMemoryObjectStore::new());
    let pipeline = Pipeline::spawn(
        config(Duration::from_secs(30)),
        store.clone(),
        Arc::new(ScriptedClient::online([1, 2])),
    );

    let input = pipeline.input();
    input.send(1).await.expect("enqueue");
    input.send(2).await.expect("enqueue");

    tokio::time::sleep(Duration::from_millis(100)).await;
    tokio::time::timeout(Duration::from_secs(2), pipeline.shutdown())
        .await
        .expect("shutdown within deadline");
}
