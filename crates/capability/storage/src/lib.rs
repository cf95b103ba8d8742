//! # 对象注册表存储层
//!
//! 提供在线对象记录的统一存储抽象，支持多种后端实现。
//!
//! ## 模块说明
//!
//! - [`models`]：数据模型（`ObjectRecord`）
//! - [`traits`]：存储接口（upsert / delete / scan-all）
//! - [`error`]：统一的存储错误类型
//! - [`connection`]：PostgreSQL 连接池与建表
//! - [`in_memory`]：内存实现（用于测试与演示）
//! - [`postgres`]：PostgreSQL 实现（生产环境使用）
//!
//! ## 设计约束
//!
//! - 所有接口返回 `StorageError`
//! - upsert 以主键 `id` 幂等；删除不存在的记录不是错误
//! - scan-all 仅在冷启动对账时使用

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod traits;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use traits::*;

pub use in_memory::InMemoryObjectStore;
pub use postgres::PgObjectStore;
