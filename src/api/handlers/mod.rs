//! API Handlers

pub mod conversation_handler;
pub mod entity_handler;
pub mod maintenance_handler;
pub mod search_handler;
pub mod short_term_handler;
pub mod working_handler;
