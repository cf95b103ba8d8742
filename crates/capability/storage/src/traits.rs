//! 存储接口 Trait 定义
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use crate::models::ObjectRecord;
use async_trait::async_trait;

/// 对象记录存储接口。
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 以主键 `id` 插入或更新记录。相同 `(id, last_seen_at)` 的重复
    /// upsert 在存储层面是无操作。
    async fn upsert_object(&self, record: &ObjectRecord) -> Result<(), StorageError>;

    /// 按标识删除记录。记录不存在时不报错。
    async fn delete_object(&self, id: i64) -> Result<(), StorageError>;

    /// 全表扫描，仅供冷启动对账使用。
    async fn list_objects(&self) -> Result<Vec<ObjectRecord>, StorageError>;
}
