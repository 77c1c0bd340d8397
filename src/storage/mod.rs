//! 存储模块
//!
//! 两个物理基座：SurrealDB 持久层与 Redis 短期缓存层。

pub mod cache;
pub mod surrealdb;
