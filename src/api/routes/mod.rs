//! API Routes

pub mod conversation_routes;
pub mod entity_routes;
pub mod maintenance_routes;
pub mod search_routes;
pub mod short_term_routes;
pub mod working_routes;
