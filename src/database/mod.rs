// src/database/mod.rs
pub mod history_repo;
pub mod pool;
pub mod routing_repo;

pub use history_repo::PgHistorySink;
pub use pool::{create_pool, DbPool};
pub use routing_repo::PgRoutingSource;
