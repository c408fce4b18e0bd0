// src/ari/event.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Marker placed first in `appArgs` of the operator leg.
pub const OUTBOUND_MARKER: &str = "outbound";

const UNKNOWN: &str = "Unknown";

// `PJSIP/105-00000001` -> `105`
static CHANNEL_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^/]+/([^-]+)").expect("channel name pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CallerId {
    #[serde(default)]
    pub number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dialplan {
    #[serde(default)]
    pub exten: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub caller: CallerId,
    #[serde(default)]
    pub dialplan: Option<Dialplan>,
}

impl Channel {
    pub fn is_up(&self) -> bool {
        self.state.eq_ignore_ascii_case("up")
    }

    /// Advertised caller number, or the device id from the channel name when
    /// the number is empty/unknown/anonymous (internal calls).
    pub fn caller_number(&self) -> String {
        let number = self.caller.number.trim();
        if !number.is_empty()
            && !number.eq_ignore_ascii_case("unknown")
            && !number.eq_ignore_ascii_case("anonymous")
        {
            return number.to_string();
        }

        CHANNEL_NAME_RE
            .captures(&self.name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn dialed_number(&self) -> String {
        self.dialplan
            .as_ref()
            .map(|d| d.exten.trim())
            .filter(|exten| !exten.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bridge {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LiveRecording {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Events consumed from the ARI event stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum AriEvent {
    StasisStart {
        channel: Channel,
        #[serde(default)]
        args: Vec<String>,
    },
    StasisEnd {
        channel: Channel,
    },
    ChannelStateChange {
        channel: Channel,
    },
    RecordingFinished {
        recording: LiveRecording,
    },
    RecordingFailed {
        recording: LiveRecording,
    },
    ChannelDestroyed {
        channel: Channel,
    },
    ChannelEnteredBridge {
        channel: Channel,
        bridge: Bridge,
    },
    ChannelLeftBridge {
        channel: Channel,
        bridge: Bridge,
    },
    #[serde(other)]
    Unknown,
}

impl AriEvent {
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AriEvent::StasisStart { .. } => "StasisStart",
            AriEvent::StasisEnd { .. } => "StasisEnd",
            AriEvent::ChannelStateChange { .. } => "ChannelStateChange",
            AriEvent::RecordingFinished { .. } => "RecordingFinished",
            AriEvent::RecordingFailed { .. } => "RecordingFailed",
            AriEvent::ChannelDestroyed { .. } => "ChannelDestroyed",
            AriEvent::ChannelEnteredBridge { .. } => "ChannelEnteredBridge",
            AriEvent::ChannelLeftBridge { .. } => "ChannelLeftBridge",
            AriEvent::Unknown => "Unknown",
        }
    }
}

/// Bridge id carried by an operator leg's `StasisStart` args
/// (`["outbound", "<bridgeId>"]`), if this is one.
pub fn outbound_bridge_id(args: &[String]) -> Option<&str> {
    match args {
        [marker, bridge_id, ..] if marker == OUTBOUND_MARKER => Some(bridge_id.as_str()),
        [marker] if marker == OUTBOUND_MARKER => Some(""),
        _ => None,
    }
}
