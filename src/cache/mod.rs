// src/cache/mod.rs
pub mod correlation;
pub mod memory;
pub mod redis_client;

pub use correlation::CorrelationStore;
pub use memory::MemoryStore;
pub use redis_client::RedisClient;

/// TTL for every correlation entry (30 minutes)
pub const CALL_TTL_SECS: u64 = 1800;

/// Helper for generating consistent cache keys
pub struct CacheKeys;

impl CacheKeys {
    /// Key for a call leg: `call:{channel_id}`
    pub fn call(channel_id: &str) -> String {
        format!("call:{}", channel_id)
    }

    /// Key for a bridge: `bridge_info:{bridge_id}`
    pub fn bridge_info(bridge_id: &str) -> String {
        format!("bridge_info:{}", bridge_id)
    }
}
