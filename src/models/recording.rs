// src/models/recording.rs
use once_cell::sync::Lazy;
use regex::Regex;

pub const RECORDING_PREFIX: &str = "rec_";

// Greedy capture: the bridge id may itself contain underscores and digits.
static RECORDING_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rec_(.+)_(\d+)$").expect("recording name pattern is valid")
});

/// `rec_<bridgeId>_<unixTimestamp>`
pub fn recording_name(bridge_id: &str, unix_timestamp: i64) -> String {
    format!("{}{}_{}", RECORDING_PREFIX, bridge_id, unix_timestamp)
}

/// Extracts the bridge id from a recording name built by [`recording_name`].
pub fn bridge_id_from_recording(name: &str) -> Option<&str> {
    RECORDING_NAME_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Builds the path the engine stores a finished recording under.
pub fn recording_file_path(directory: &str, name: &str, format: &str) -> String {
    format!("{}/{}.{}", directory.trim_end_matches('/'), name, format)
}
