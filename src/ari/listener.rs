// src/ari/listener.rs
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use crate::ari::{AriEvent, AriEventStream};
use crate::config::AriConfig;
use crate::error::{CallControlError, Result};
use crate::services::CallOrchestrator;

/// Owns the event stream and feeds the orchestrator one event at a time.
pub struct AriListener {
    config: AriConfig,
    orchestrator: Arc<CallOrchestrator>,
}

impl AriListener {
    pub fn new(config: AriConfig, orchestrator: Arc<CallOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    /// Opens the first session. A failure here is a startup error.
    pub async fn connect(&self) -> Result<AriEventStream> {
        AriEventStream::connect(&self.config).await
    }

    /// Runs until the stream is lost. Without a configured reconnect delay
    /// the loss is returned as an error; with one, the listener reconnects
    /// forever.
    pub async fn run(&self, mut stream: AriEventStream) -> Result<()> {
        loop {
            let server_id = stream.server_id().to_string();

            match self.listen(&mut stream).await {
                Ok(()) => warn!("ARI event stream ended: {}", server_id),
                Err(e) => error!("ARI event stream error for {}: {}", server_id, e),
            }

            let delay = match self.config.reconnect_delay {
                Some(delay) => delay,
                None => {
                    return Err(CallControlError::EventStream(format!(
                        "connection to {} lost",
                        server_id
                    )))
                }
            };

            stream = loop {
                warn!("Reconnecting to {} in {} seconds...", server_id, delay.as_secs());
                sleep(delay).await;

                match self.connect().await {
                    Ok(stream) => break stream,
                    Err(e) => error!("ARI reconnect to {} failed: {}", server_id, e),
                }
            };
        }
    }

    async fn listen(&self, stream: &mut AriEventStream) -> Result<()> {
        while let Some(payload) = stream.next_payload().await? {
            dispatch_payload(&self.orchestrator, &payload).await;
        }
        Ok(())
    }
}

/// Parses one raw message and hands it to the orchestrator.
///
/// Returns `false` when the payload was dropped as malformed.
pub async fn dispatch_payload(orchestrator: &CallOrchestrator, payload: &str) -> bool {
    let event = match AriEvent::parse(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!("Dropping malformed ARI event: {} - Payload: {}", e, payload);
            return false;
        }
    };

    debug!("📨 EVENT: {}", event.kind());

    if let Err(e) = orchestrator.handle_event(event).await {
        error!("Error handling ARI event: {}", e);
    }
    true
}
