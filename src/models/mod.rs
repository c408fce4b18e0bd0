// src/models/mod.rs
pub mod call_attempt;
pub mod call_history;
pub mod recording;

pub use call_attempt::{CallAttempt, CallState};
pub use call_history::{CallHistoryRecord, CallStatus};

use serde::Serialize;

// ==================== API DTOs ====================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsResponse {
    pub events_handled: u64,
    pub calls_started: u64,
    pub setup_failures: u64,
    pub history_records: u64,
    pub best_effort_failures: u64,
}
