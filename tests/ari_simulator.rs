// tests/ari_simulator.rs
//! ARI Event Simulator for Integration Testing
//!
//! Builds the JSON payloads the telephony engine pushes over the event stream
//! and provides in-process fakes for the orchestrator's ports, so complete
//! call lifecycles can be driven without a PBX, Redis or PostgreSQL.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use onecall_call_engine::ari::listener::dispatch_payload;
use onecall_call_engine::cache::{CorrelationStore, MemoryStore};
use onecall_call_engine::error::{CallControlError, Result};
use onecall_call_engine::models::CallHistoryRecord;
use onecall_call_engine::services::{CallOrchestrator, CallRouter, OrchestratorSettings};
use onecall_call_engine::traits::{ControlClient, HistorySink, OutboundChannelRequest, RoutingSource};

pub const RECORDING_DIR: &str = "/var/spool/asterisk/recording";

/// Channel payload builder
pub struct ChannelBuilder {
    channel: Value,
}

impl ChannelBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            channel: json!({
                "id": id,
                "name": "",
                "state": "Ring",
                "caller": {"number": ""},
                "dialplan": {"exten": ""}
            }),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.channel["name"] = json!(name);
        self
    }

    pub fn state(mut self, state: &str) -> Self {
        self.channel["state"] = json!(state);
        self
    }

    pub fn caller(mut self, number: &str) -> Self {
        self.channel["caller"]["number"] = json!(number);
        self
    }

    pub fn exten(mut self, exten: &str) -> Self {
        self.channel["dialplan"]["exten"] = json!(exten);
        self
    }

    pub fn build(self) -> Value {
        self.channel
    }
}

pub fn stasis_start(channel: Value, args: &[&str]) -> String {
    json!({"type": "StasisStart", "args": args, "channel": channel}).to_string()
}

pub fn stasis_end(channel_id: &str) -> String {
    json!({"type": "StasisEnd", "channel": {"id": channel_id}}).to_string()
}

pub fn state_change(channel_id: &str, state: &str) -> String {
    json!({"type": "ChannelStateChange", "channel": {"id": channel_id, "state": state}}).to_string()
}

pub fn recording_finished(name: &str, duration: i32) -> String {
    json!({
        "type": "RecordingFinished",
        "recording": {"name": name, "duration": duration, "format": "wav"}
    })
    .to_string()
}

pub fn channel_destroyed(channel_id: &str) -> String {
    json!({"type": "ChannelDestroyed", "channel": {"id": channel_id}}).to_string()
}

/// One inbound call as the engine would report it
pub struct SimulatedCall {
    pub inbound_id: String,
    pub caller: String,
    pub called: String,
    pub device: String,
}

impl SimulatedCall {
    pub fn new(inbound_id: &str, caller: &str, called: &str) -> Self {
        Self {
            inbound_id: inbound_id.to_string(),
            caller: caller.to_string(),
            called: called.to_string(),
            device: "105".to_string(),
        }
    }

    pub fn inbound_stasis_start(&self) -> String {
        let channel = ChannelBuilder::new(&self.inbound_id)
            .name(&format!("PJSIP/{}-00000001", self.device))
            .caller(&self.caller)
            .exten(&self.called)
            .build();
        stasis_start(channel, &[])
    }

    pub fn operator_stasis_start(&self, outbound_id: &str, bridge_id: &str) -> String {
        let channel = ChannelBuilder::new(outbound_id)
            .name("PJSIP/101-00000002")
            .state("Down")
            .build();
        stasis_start(channel, &["outbound", bridge_id])
    }
}

/// Control client that logs every command and hands out sequential ids
#[derive(Default)]
pub struct RecordingControl {
    commands: Mutex<Vec<String>>,
    requests: Mutex<Vec<OutboundChannelRequest>>,
    failing: Mutex<HashSet<&'static str>>,
    bridges: AtomicUsize,
    channels: AtomicUsize,
}

impl RecordingControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `operation` fail with a 500.
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<OutboundChannelRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn log(&self, operation: &'static str, detail: String) -> Result<()> {
        self.commands.lock().unwrap().push(format!("{} {}", operation, detail));
        if self.failing.lock().unwrap().contains(operation) {
            return Err(CallControlError::AriStatus { operation, status: 500 });
        }
        Ok(())
    }
}

#[async_trait]
impl ControlClient for RecordingControl {
    async fn indicate_ringing(&self, channel_id: &str) -> Result<()> {
        self.log("ring", channel_id.to_string())
    }

    async fn create_bridge(&self) -> Result<String> {
        let id = format!("B{}", self.bridges.fetch_add(1, Ordering::SeqCst) + 1);
        self.log("create_bridge", id.clone())?;
        Ok(id)
    }

    async fn create_outbound_channel(&self, request: &OutboundChannelRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        let id = format!("OUT{}", self.channels.fetch_add(1, Ordering::SeqCst) + 1);
        self.log("dial", format!("{} {}", request.endpoint, id))?;
        Ok(id)
    }

    async fn answer(&self, channel_id: &str) -> Result<()> {
        self.log("answer", channel_id.to_string())
    }

    async fn add_to_bridge(&self, bridge_id: &str, channel_id: &str) -> Result<()> {
        self.log("add_channel", format!("{} {}", bridge_id, channel_id))
    }

    async fn start_recording(&self, bridge_id: &str, name: &str) -> Result<()> {
        self.log("record", format!("{} {}", bridge_id, name))
    }

    async fn hangup(&self, channel_id: &str) -> Result<()> {
        self.log("hangup", channel_id.to_string())
    }

    async fn destroy_bridge(&self, bridge_id: &str) -> Result<()> {
        self.log("destroy_bridge", bridge_id.to_string())
    }
}

/// Fixed routing table: dialed number -> extensions
#[derive(Default)]
pub struct StaticRouting {
    table: HashMap<String, Vec<String>>,
}

impl StaticRouting {
    pub fn with(mut self, dialed: &str, extensions: &[&str]) -> Self {
        self.table.insert(
            dialed.to_string(),
            extensions.iter().map(|e| e.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl RoutingSource for StaticRouting {
    async fn operator_extensions(&self, dialed_number: &str) -> Result<Vec<String>> {
        Ok(self.table.get(dialed_number).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct CollectingSink {
    records: Mutex<Vec<CallHistoryRecord>>,
}

impl CollectingSink {
    pub fn records(&self) -> Vec<CallHistoryRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistorySink for CollectingSink {
    async fn record(&self, record: &CallHistoryRecord) -> Result<i64> {
        let mut records = self.records.lock().unwrap();
        records.push(record.clone());
        Ok(records.len() as i64)
    }
}

/// Orchestrator wired to the fakes above
pub struct Harness {
    pub orchestrator: Arc<CallOrchestrator>,
    pub control: Arc<RecordingControl>,
    pub sink: Arc<CollectingSink>,
    pub memory: MemoryStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_routing(StaticRouting::default().with("1000", &["101", "102"]))
    }

    pub fn with_routing(routing: StaticRouting) -> Self {
        let control = Arc::new(RecordingControl::new());
        let sink = Arc::new(CollectingSink::default());
        let memory = MemoryStore::new();

        let orchestrator = CallOrchestrator::new(
            control.clone(),
            CorrelationStore::new(Arc::new(memory.clone())),
            CallRouter::new(Arc::new(routing), "PJSIP"),
            sink.clone(),
            OrchestratorSettings {
                app: "onecall".to_string(),
                dial_timeout_secs: 30,
                recording_dir: RECORDING_DIR.to_string(),
                recording_format: "wav".to_string(),
            },
        );

        Self {
            orchestrator: Arc::new(orchestrator),
            control,
            sink,
            memory,
        }
    }

    pub async fn send(&self, payload: &str) -> bool {
        dispatch_payload(&self.orchestrator, payload).await
    }

    /// Recording name started by the last `record` command.
    pub fn last_recording(&self) -> Option<String> {
        self.control
            .commands()
            .iter()
            .rev()
            .find(|c| c.starts_with("record "))
            .and_then(|c| c.split_whitespace().nth(2))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_stasis_start_payload() {
        let call = SimulatedCall::new("C1", "", "1000");
        let event: Value = serde_json::from_str(&call.inbound_stasis_start()).unwrap();

        assert_eq!(event["type"], "StasisStart");
        assert_eq!(event["channel"]["id"], "C1");
        assert_eq!(event["channel"]["name"], "PJSIP/105-00000001");
        assert_eq!(event["channel"]["dialplan"]["exten"], "1000");
        assert_eq!(event["args"], json!([]));
    }

    #[test]
    fn test_operator_stasis_start_payload() {
        let call = SimulatedCall::new("C1", "998901234567", "1000");
        let event: Value = serde_json::from_str(&call.operator_stasis_start("OUT1", "B1")).unwrap();

        assert_eq!(event["args"], json!(["outbound", "B1"]));
        assert_eq!(event["channel"]["id"], "OUT1");
    }

    #[tokio::test]
    async fn test_recording_control_ids_and_failures() {
        let control = RecordingControl::new();
        assert_eq!(control.create_bridge().await.unwrap(), "B1");
        assert_eq!(control.create_bridge().await.unwrap(), "B2");

        control.fail("hangup");
        assert!(control.hangup("C1").await.is_err());
        assert_eq!(control.commands(), vec!["create_bridge B1", "create_bridge B2", "hangup C1"]);
    }
}
