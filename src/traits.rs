//! Ports between the call orchestrator and the outside world
//!
//! The orchestrator only ever talks to these traits, so the telephony
//! engine, the correlation backend and the persistence layer can each be
//! swapped (or faked in tests) independently.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::CallHistoryRecord;

/// Key-value store with per-entry time-to-live.
///
/// Values are opaque strings; overwriting a key replaces its value and
/// resets its TTL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Parameters for originating the operator leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundChannelRequest {
    pub endpoint: String,
    pub app: String,
    pub app_args: String,
    pub caller_id: String,
    pub timeout_secs: u32,
}

/// Commands against the telephony engine's REST control surface.
///
/// Only `create_bridge` and `create_outbound_channel` gate orchestration;
/// the caller treats every other error as best-effort.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlClient: Send + Sync {
    async fn indicate_ringing(&self, channel_id: &str) -> Result<()>;

    /// Returns the new bridge id.
    async fn create_bridge(&self) -> Result<String>;

    /// Returns the new channel id.
    async fn create_outbound_channel(&self, request: &OutboundChannelRequest) -> Result<String>;

    async fn answer(&self, channel_id: &str) -> Result<()>;

    async fn add_to_bridge(&self, bridge_id: &str, channel_id: &str) -> Result<()>;

    async fn start_recording(&self, bridge_id: &str, name: &str) -> Result<()>;

    /// No-op for an empty id.
    async fn hangup(&self, channel_id: &str) -> Result<()>;

    /// No-op for an empty id.
    async fn destroy_bridge(&self, bridge_id: &str) -> Result<()>;
}

/// Routing data: dialed number -> operator extensions of the mapped group.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoutingSource: Send + Sync {
    /// Ordered extensions, empty if the number is unmapped or the group has
    /// no members.
    async fn operator_extensions(&self, dialed_number: &str) -> Result<Vec<String>>;
}

/// Durable call history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistorySink: Send + Sync {
    /// Persists the record and returns its id.
    async fn record(&self, record: &CallHistoryRecord) -> Result<i64>;
}
