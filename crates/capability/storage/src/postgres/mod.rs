//! # PostgreSQL 存储实现模块
//!
//! ## 设计原则
//!
//! 1. **参数化查询**：所有 SQL 查询使用参数绑定，防止 SQL 注入
//! 2. **幂等写入**：upsert 使用 `on conflict (id) do update`，
//!    delete 不区分记录是否存在
//! 3. **连接池管理**：使用连接池复用数据库连接
//!
//! ## 数据库模式要求
//!
//! 依赖单表 `objects (id bigint primary key, last_seen_at timestamptz)`，
//! 由 [`crate::connection::init_schema`] 在启动时创建。

pub mod object;

pub use object::*;
