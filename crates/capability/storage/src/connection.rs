//! 数据库连接管理
//!
//! - connect_pool：建立 Postgres 连接池
//! - init_schema：执行单表 DDL

use crate::error::StorageError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// 建立 Postgres 连接池。
///
/// # 参数
/// - `database_url`：Postgres 连接字符串
/// - `max_connections`：连接池上限（POSTGRES_POOL_MAX_CONNS）
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<PgPool, StorageError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// 建表。幂等，可在每次启动时执行。
pub async fn init_schema(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::query("create table if not exists objects (id bigint primary key, last_seen_at timestamptz)")
        .execute(pool)
        .await?;
    Ok(())
}
