// src/models/call_attempt.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CallControlError, Result};
use crate::models::CallStatus;

/// Lifecycle state of one call attempt.
///
/// `Connected` only lives between the operator answering and the recording
/// being started; it is never observed by another event in practice, but the
/// transition is still checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallState {
    Ringing,
    Connected {
        answered_at: DateTime<Utc>,
    },
    Recording {
        answered_at: DateTime<Utc>,
        recording_name: String,
    },
    Terminated {
        status: CallStatus,
        answered_at: Option<DateTime<Utc>>,
    },
}

impl CallState {
    pub fn name(&self) -> &'static str {
        match self {
            CallState::Ringing => "ringing",
            CallState::Connected { .. } => "connected",
            CallState::Recording { .. } => "recording",
            CallState::Terminated { .. } => "terminated",
        }
    }
}

/// One inbound call and the resources created for it.
///
/// Stored by value under `call:<inbound>`, `call:<outbound>` and
/// `bridge_info:<bridge>`; every write goes through all three keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallAttempt {
    pub bridge_id: String,
    pub inbound_channel_id: String,
    pub outbound_channel_id: String,
    pub caller: String,
    pub called: String,
    pub state: CallState,
}

impl CallAttempt {
    pub fn new(
        bridge_id: String,
        inbound_channel_id: String,
        outbound_channel_id: String,
        caller: String,
        called: String,
    ) -> Self {
        Self {
            bridge_id,
            inbound_channel_id,
            outbound_channel_id,
            caller,
            called,
            state: CallState::Ringing,
        }
    }

    pub fn is_inbound(&self, channel_id: &str) -> bool {
        self.inbound_channel_id == channel_id
    }

    pub fn is_outbound(&self, channel_id: &str) -> bool {
        self.outbound_channel_id == channel_id
    }

    /// Set once the operator leg answers.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            CallState::Ringing => None,
            CallState::Connected { answered_at } | CallState::Recording { answered_at, .. } => {
                Some(*answered_at)
            }
            CallState::Terminated { answered_at, .. } => *answered_at,
        }
    }

    pub fn recording_name(&self) -> Option<&str> {
        match &self.state {
            CallState::Recording { recording_name, .. } => Some(recording_name),
            _ => None,
        }
    }

    pub fn connect(&mut self, answered_at: DateTime<Utc>) -> Result<()> {
        match self.state {
            CallState::Ringing => {
                self.state = CallState::Connected { answered_at };
                Ok(())
            }
            _ => Err(self.invalid("connected")),
        }
    }

    pub fn start_recording(&mut self, recording_name: String) -> Result<()> {
        match self.state {
            CallState::Connected { answered_at } => {
                self.state = CallState::Recording {
                    answered_at,
                    recording_name,
                };
                Ok(())
            }
            _ => Err(self.invalid("recording")),
        }
    }

    pub fn terminate(&mut self, status: CallStatus) -> Result<()> {
        if matches!(self.state, CallState::Terminated { .. }) {
            return Err(self.invalid("terminated"));
        }
        self.state = CallState::Terminated {
            status,
            answered_at: self.start_time(),
        };
        Ok(())
    }

    fn invalid(&self, to: &'static str) -> CallControlError {
        CallControlError::InvalidTransition {
            from: self.state.name(),
            to,
        }
    }
}
