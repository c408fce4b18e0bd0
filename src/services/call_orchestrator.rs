// src/services/call_orchestrator.rs
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::ari::event::{outbound_bridge_id, Channel, LiveRecording, OUTBOUND_MARKER};
use crate::ari::AriEvent;
use crate::cache::CorrelationStore;
use crate::error::Result;
use crate::models::recording::{bridge_id_from_recording, recording_file_path, recording_name};
use crate::models::{CallAttempt, CallHistoryRecord, CallState, CallStatus, StatsResponse};
use crate::services::CallRouter;
use crate::traits::{ControlClient, HistorySink, OutboundChannelRequest};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub app: String,
    pub dial_timeout_secs: u32,
    pub recording_dir: String,
    pub recording_format: String,
}

/// A signaling or teardown command that failed and was not retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestEffortFailure {
    pub operation: &'static str,
    pub target: String,
    pub error: String,
}

pub type FailureHook = Arc<dyn Fn(&BestEffortFailure) + Send + Sync>;

#[derive(Default)]
struct Counters {
    events_handled: AtomicU64,
    calls_started: AtomicU64,
    setup_failures: AtomicU64,
    history_records: AtomicU64,
    best_effort_failures: AtomicU64,
}

/// Drives each inbound call through ringing, bridged/recording and
/// termination.
///
/// Events must be fed one at a time: every transition is a
/// read-modify-write of the correlation entries with no per-key locking.
pub struct CallOrchestrator {
    control: Arc<dyn ControlClient>,
    store: CorrelationStore,
    router: CallRouter,
    history: Arc<dyn HistorySink>,
    settings: OrchestratorSettings,
    counters: Counters,
    failure_hook: Option<FailureHook>,
}

impl CallOrchestrator {
    pub fn new(
        control: Arc<dyn ControlClient>,
        store: CorrelationStore,
        router: CallRouter,
        history: Arc<dyn HistorySink>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            control,
            store,
            router,
            history,
            settings,
            counters: Counters::default(),
            failure_hook: None,
        }
    }

    /// Called for every best-effort command that fails, after it is logged.
    pub fn with_failure_hook(mut self, hook: FailureHook) -> Self {
        self.failure_hook = Some(hook);
        self
    }

    pub fn store(&self) -> &CorrelationStore {
        &self.store
    }

    pub fn stats(&self) -> StatsResponse {
        StatsResponse {
            events_handled: self.counters.events_handled.load(Ordering::Relaxed),
            calls_started: self.counters.calls_started.load(Ordering::Relaxed),
            setup_failures: self.counters.setup_failures.load(Ordering::Relaxed),
            history_records: self.counters.history_records.load(Ordering::Relaxed),
            best_effort_failures: self.counters.best_effort_failures.load(Ordering::Relaxed),
        }
    }

    pub async fn handle_event(&self, event: AriEvent) -> Result<()> {
        self.counters.events_handled.fetch_add(1, Ordering::Relaxed);

        match event {
            AriEvent::StasisStart { channel, args } => match outbound_bridge_id(&args) {
                // The operator leg was stored together with the inbound leg.
                Some(bridge_id) => {
                    debug!("Operator leg {} entered app for bridge {}", channel.id, bridge_id);
                    Ok(())
                }
                None => self.on_inbound_call(&channel).await,
            },
            AriEvent::ChannelStateChange { channel } => {
                debug!("🔄 State: {} -> {}", channel.id, channel.state);
                if channel.is_up() {
                    self.on_channel_up(&channel.id).await
                } else {
                    Ok(())
                }
            }
            AriEvent::StasisEnd { channel } => self.on_leg_hangup(&channel.id).await,
            AriEvent::RecordingFinished { recording } => self.on_recording_finished(&recording).await,
            AriEvent::RecordingFailed { recording } => {
                // No history is written for a failed recording.
                error!("❌ Recording FAILED: {}", recording.name);
                Ok(())
            }
            AriEvent::ChannelDestroyed { channel } => {
                debug!("💀 Destroyed: {}", channel.id);
                Ok(())
            }
            AriEvent::ChannelEnteredBridge { channel, bridge } => {
                info!("➡️  Entered bridge: {} -> {}", channel.id, bridge.id);
                Ok(())
            }
            AriEvent::ChannelLeftBridge { channel, bridge } => {
                info!("⬅️  Left bridge: {} <- {}", channel.id, bridge.id);
                Ok(())
            }
            AriEvent::Unknown => Ok(()),
        }
    }

    async fn on_inbound_call(&self, channel: &Channel) -> Result<()> {
        let inbound = channel.id.as_str();
        let caller = channel.caller_number();
        let called = channel.dialed_number();

        info!("📞 NEW INBOUND CALL: {} - {} → {}", inbound, caller, called);

        // Ring only: the inbound leg is answered once an operator picks up.
        let ringing = self.control.indicate_ringing(inbound).await;
        self.best_effort("ring", inbound, ringing);

        let bridge_id = match self.control.create_bridge().await {
            Ok(id) => id,
            Err(e) => {
                error!("❌ Bridge creation failed for call {}: {}", inbound, e);
                self.counters.setup_failures.fetch_add(1, Ordering::Relaxed);
                let hangup = self.control.hangup(inbound).await;
                self.best_effort("hangup", inbound, hangup);
                return Ok(());
            }
        };

        let endpoint = self.router.resolve(&called).await;
        let request = OutboundChannelRequest {
            endpoint: endpoint.clone(),
            app: self.settings.app.clone(),
            app_args: format!("{},{}", OUTBOUND_MARKER, bridge_id),
            caller_id: caller.clone(),
            timeout_secs: self.settings.dial_timeout_secs,
        };

        let outbound = match self.control.create_outbound_channel(&request).await {
            Ok(id) => id,
            Err(e) => {
                error!("❌ Could not dial {} for call {}: {}", endpoint, inbound, e);
                self.counters.setup_failures.fetch_add(1, Ordering::Relaxed);
                let destroyed = self.control.destroy_bridge(&bridge_id).await;
                self.best_effort("destroy_bridge", &bridge_id, destroyed);
                let hangup = self.control.hangup(inbound).await;
                self.best_effort("hangup", inbound, hangup);
                return Ok(());
            }
        };

        let attempt = CallAttempt::new(bridge_id, inbound.to_string(), outbound, caller, called);

        if let Err(e) = self.store.save(&attempt).await {
            error!("❌ Could not store call {}, tearing it down: {}", inbound, e);
            self.counters.setup_failures.fetch_add(1, Ordering::Relaxed);
            self.teardown(&attempt).await;
            self.store.forget_all(&attempt).await;
            return Err(e);
        }

        self.counters.calls_started.fetch_add(1, Ordering::Relaxed);
        info!(
            "🔔 Ringing {} for call {} (bridge {}, operator leg {})",
            endpoint, attempt.inbound_channel_id, attempt.bridge_id, attempt.outbound_channel_id
        );
        Ok(())
    }

    async fn on_channel_up(&self, channel_id: &str) -> Result<()> {
        let Some(found) = self.store.by_channel(channel_id).await else {
            debug!("Ignoring answer on untracked channel {}", channel_id);
            return Ok(());
        };
        let mut attempt = self.with_bridge_state(found).await;

        // The inbound leg goes up because we answer it below.
        if !attempt.is_outbound(channel_id) {
            return Ok(());
        }

        if attempt.state != CallState::Ringing {
            debug!("Duplicate answer for {} ignored ({})", channel_id, attempt.state.name());
            return Ok(());
        }

        info!("✅ Operator answered call {}. Connecting bridge {}", attempt.inbound_channel_id, attempt.bridge_id);

        let answered = self.control.answer(&attempt.inbound_channel_id).await;
        self.best_effort("answer", &attempt.inbound_channel_id, answered);

        for leg in [&attempt.inbound_channel_id, &attempt.outbound_channel_id] {
            let added = self.control.add_to_bridge(&attempt.bridge_id, leg).await;
            self.best_effort("add_channel", leg, added);
        }

        let now = Utc::now();
        let name = recording_name(&attempt.bridge_id, now.timestamp());
        attempt.connect(now)?;
        attempt.start_recording(name.clone())?;

        // The legs are already answered and bridged, so the recording starts
        // even if some copies were not updated.
        let saved = self.store.save(&attempt).await;
        if let Err(e) = &saved {
            error!("❌ Could not fully store answered call {}: {}", attempt.inbound_channel_id, e);
        }

        info!("🎙 Starting recording {} for bridge {}", name, attempt.bridge_id);
        let recording = self.control.start_recording(&attempt.bridge_id, &name).await;
        self.best_effort("record", &attempt.bridge_id, recording);

        saved
    }

    async fn on_leg_hangup(&self, channel_id: &str) -> Result<()> {
        let Some(found) = self.store.by_channel(channel_id).await else {
            debug!("Ignoring hangup on untracked channel {}", channel_id);
            return Ok(());
        };
        let mut attempt = self.with_bridge_state(found).await;

        info!("📴 Call ended on {} (call {})", channel_id, attempt.inbound_channel_id);
        self.teardown(&attempt).await;

        if let CallState::Recording { recording_name, .. } = &attempt.state {
            // RecordingFinished still needs caller/called/start time and is
            // keyed by bridge, so only the channel keys go now.
            info!("⏳ Waiting for recording {} of call {}", recording_name, attempt.inbound_channel_id);
            self.store.forget_channels(&attempt).await;
            return Ok(());
        }

        self.store.forget_all(&attempt).await;

        // Both legs report StasisEnd; only the inbound one writes history.
        if !attempt.is_inbound(channel_id) {
            return Ok(());
        }

        attempt.terminate(CallStatus::NoAnswer)?;
        let record = CallHistoryRecord::no_answer(&attempt, Utc::now());
        self.emit(record).await
    }

    async fn on_recording_finished(&self, recording: &LiveRecording) -> Result<()> {
        let duration = recording.duration.unwrap_or(0);
        let format = recording
            .format
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(&self.settings.recording_format);
        let file = (!recording.name.is_empty())
            .then(|| recording_file_path(&self.settings.recording_dir, &recording.name, format));

        info!("✅ Recording finished: {} ({}s)", recording.name, duration);

        let mut attempt = match bridge_id_from_recording(&recording.name) {
            Some(bridge_id) => {
                let attempt = self.store.by_bridge(bridge_id).await;
                if attempt.is_some() {
                    self.store.forget_bridge(bridge_id).await;
                } else {
                    warn!("⚠️  No call context for bridge {}, writing partial history", bridge_id);
                }
                attempt
            }
            None => {
                warn!("⚠️  Recording name {} does not carry a bridge id", recording.name);
                None
            }
        };

        let status = CallStatus::from_recording_duration(duration);
        if let Some(attempt) = attempt.as_mut() {
            attempt.terminate(status)?;
        }

        let record = CallHistoryRecord::from_recording(
            attempt.as_ref(),
            &recording.name,
            file,
            duration,
            Utc::now(),
        );
        self.emit(record).await
    }

    /// A channel copy still `Ringing` can trail a bridge copy that reached
    /// `Recording` when a save only partly landed. The bridge copy wins: it is
    /// the one RecordingFinished reads.
    async fn with_bridge_state(&self, attempt: CallAttempt) -> CallAttempt {
        if attempt.state != CallState::Ringing {
            return attempt;
        }

        match self.store.by_bridge(&attempt.bridge_id).await {
            Some(bridge_copy) if matches!(bridge_copy.state, CallState::Recording { .. }) => {
                warn!("⚠️  Stale channel copy for call {}, using bridge {}", attempt.inbound_channel_id, attempt.bridge_id);
                bridge_copy
            }
            _ => attempt,
        }
    }

    /// Hangs up both legs and destroys the bridge; already-gone resources
    /// only produce best-effort failures.
    async fn teardown(&self, attempt: &CallAttempt) {
        for leg in [&attempt.inbound_channel_id, &attempt.outbound_channel_id] {
            let hangup = self.control.hangup(leg).await;
            self.best_effort("hangup", leg, hangup);
        }
        let destroyed = self.control.destroy_bridge(&attempt.bridge_id).await;
        self.best_effort("destroy_bridge", &attempt.bridge_id, destroyed);
    }

    async fn emit(&self, record: CallHistoryRecord) -> Result<()> {
        match self.history.record(&record).await {
            Ok(id) => {
                self.counters.history_records.fetch_add(1, Ordering::Relaxed);
                info!(
                    "💾 CallHistory saved: #{} - {:?} → {:?}, {}s, {}",
                    id,
                    record.source,
                    record.destination,
                    record.duration_seconds,
                    record.status.as_str()
                );
                Ok(())
            }
            Err(e) => {
                error!("❌ Failed to save call history {:?}: {}", record.call_id, e);
                Err(e)
            }
        }
    }

    fn best_effort(&self, operation: &'static str, target: &str, result: Result<()>) {
        let Err(e) = result else {
            return;
        };

        warn!("⚠️  Best-effort {} on {} failed: {}", operation, target, e);
        self.counters.best_effort_failures.fetch_add(1, Ordering::Relaxed);

        if let Some(hook) = &self.failure_hook {
            hook(&BestEffortFailure {
                operation,
                target: target.to_string(),
                error: e.to_string(),
            });
        }
    }
}
