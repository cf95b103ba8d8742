//! 对象记录内存实现（用于测试与占位）。

use crate::error::StorageError;
use crate::models::ObjectRecord;
use crate::traits::ObjectStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<i64, Option<DateTime<Utc>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// 预置记录的构造方式，供冷启动场景的测试使用。
    pub fn with_records(records: impl IntoIterator<Item = ObjectRecord>) -> Self {
        let objects = records
            .into_iter()
            .map(|record| (record.id, record.last_seen_at))
            .collect();
        Self {
            objects: RwLock::new(objects),
        }
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upsert_object(&self, record: &ObjectRecord) -> Result<(), StorageError> {
        let mut map = self
            .objects
            .write()
            .map_err(|_| StorageError::lock_poisoned("upsert_object"))?;
        map.insert(record.id, record.last_seen_at);
        Ok(())
    }

    async fn delete_object(&self, id: i64) -> Result<(), StorageError> {
        let mut map = self
            .objects
            .write()
            .map_err(|_| StorageError::lock_poisoned("delete_object"))?;
        map.remove(&id);
        Ok(())
    }

    async fn list_objects(&self) -> Result<Vec<ObjectRecord>, StorageError> {
        let map = self
            .objects
            .read()
            .map_err(|_| StorageError::lock_poisoned("list_objects"))?;
        Ok(map
            .iter()
            .map(|(id, last_seen_at)| ObjectRecord {
                id: *id,
                last_seen_at: *last_seen_at,
            })
            .collect())
    }
}
