//! DTO 模块
//!
//! 定义各存储层级的请求与响应数据结构。

pub mod conversation_dto;
pub mod entity_dto;
pub mod maintenance_dto;
pub mod search_dto;
pub mod short_term_dto;
pub mod working_dto;
