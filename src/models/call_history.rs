// src/models/call_history.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::CallAttempt;

pub const DIRECTION_INBOUND: &str = "inbound";
pub const HISTORY_MODULE: &str = "ARI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStatus {
    #[serde(rename = "answered")]
    Answered,
    #[serde(rename = "no-answer")]
    NoAnswer,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Answered => "answered",
            CallStatus::NoAnswer => "no-answer",
        }
    }

    /// The engine may report a zero-length recording for a call that never
    /// really connected.
    pub fn from_recording_duration(duration_seconds: i32) -> Self {
        if duration_seconds > 0 {
            CallStatus::Answered
        } else {
            CallStatus::NoAnswer
        }
    }
}

/// One row of call history, written exactly once per finished attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallHistoryRecord {
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub duration_seconds: i32,
    pub direction: String,
    pub status: CallStatus,
    pub recording_file: Option<String>,
    pub correlation_id: Option<String>,
    pub call_id: Option<String>,
    pub module: String,
}

impl CallHistoryRecord {
    /// Record for an attempt whose legs hung up before the operator answered.
    pub fn no_answer(attempt: &CallAttempt, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: attempt.start_time().unwrap_or(now),
            source: Some(attempt.caller.clone()),
            destination: Some(attempt.called.clone()),
            duration_seconds: 0,
            direction: DIRECTION_INBOUND.to_string(),
            status: CallStatus::NoAnswer,
            recording_file: None,
            correlation_id: Some(attempt.inbound_channel_id.clone()),
            call_id: Some(attempt.inbound_channel_id.clone()),
            module: HISTORY_MODULE.to_string(),
        }
    }

    /// Record for a finished recording. `attempt` is absent when the
    /// bridge-keyed entry already expired; the record is still written.
    /// An empty `recording_name` leaves `correlation_id` unset.
    pub fn from_recording(
        attempt: Option<&CallAttempt>,
        recording_name: &str,
        recording_file: Option<String>,
        duration_seconds: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: attempt.and_then(|a| a.start_time()).unwrap_or(now),
            source: attempt.map(|a| a.caller.clone()),
            destination: attempt.map(|a| a.called.clone()),
            duration_seconds,
            direction: DIRECTION_INBOUND.to_string(),
            status: CallStatus::from_recording_duration(duration_seconds),
            recording_file,
            correlation_id: Some(recording_name)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            call_id: attempt.map(|a| a.inbound_channel_id.clone()),
            module: HISTORY_MODULE.to_string(),
        }
    }
}
