//! Postgres 对象记录存储实现
//!
//! 通过 SQL 实现 [`ObjectStore`] trait。
//!
//! ## 设计要点
//!
//! - **主键 upsert**：`on conflict (id) do update` 保证重复写入幂等
//! - **删除幂等**：`delete` 对不存在的标识静默成功
//! - **参数化查询**：使用 sqlx 的参数绑定防止 SQL 注入

use crate::error::StorageError;
use crate::models::ObjectRecord;
use crate::traits::ObjectStore;
use sqlx::{PgPool, Row};

/// PostgreSQL 对象记录存储实现。
pub struct PgObjectStore {
    /// PostgreSQL 连接池
    pub pool: PgPool,
}

impl PgObjectStore {
    /// 创建新的存储实例。
    ///
    /// # 参数
    ///
    /// - `pool`: 已初始化的 PostgreSQL 连接池
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ObjectStore for PgObjectStore {
    /// 以主键插入或更新记录。
    async fn upsert_object(&self, record: &ObjectRecord) -> Result<(), StorageError> {
        sqlx::query(
            "insert into objects (id, last_seen_at) values ($1, $2) \
             on conflict (id) do update set last_seen_at = excluded.last_seen_at",
        )
        .bind(record.id)
        .bind(record.last_seen_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 按标识删除记录。受影响行数为 0 不视为错误。
    async fn delete_object(&self, id: i64) -> Result<(), StorageError> {
        sqlx::query("delete from objects where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// 全表扫描，仅供冷启动对账使用。
    async fn list_objects(&self) -> Result<Vec<ObjectRecord>, StorageError> {
        let rows = sqlx::query("select id, last_seen_at from objects")
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(ObjectRecord {
                id: row.try_get("id")?,
                last_seen_at: row.try_get("last_seen_at")?,
            });
        }
        Ok(records)
    }
}
