// src/ari/connection.rs
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use crate::config::AriConfig;
use crate::error::Result;

/// One WebSocket session on the ARI event stream.
pub struct AriEventStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    server_id: String,
}

impl AriEventStream {
    pub async fn connect(config: &AriConfig) -> Result<Self> {
        let server_id = format!("{}/{}", config.host, config.app);
        info!("🔌 Connecting to ARI event stream: ws://{}/ari/events (app={})", config.host, config.app);

        let (socket, response) = connect_async(config.events_url()).await?;

        info!("✅ ARI event stream connected: {} (status {})", server_id, response.status());

        Ok(Self { socket, server_id })
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Next text payload, or `None` once the engine closes the stream.
    pub async fn next_payload(&mut self) -> Result<Option<String>> {
        while let Some(frame) = self.socket.next().await {
            let message = frame?;

            if message.is_text() {
                return Ok(Some(message.to_text()?.to_owned()));
            }

            match message {
                Message::Close(reason) => {
                    warn!("ARI event stream {} closed by peer: {:?}", self.server_id, reason);
                    return Ok(None);
                }
                Message::Binary(data) => {
                    debug!("Ignoring {} byte binary frame from {}", data.len(), self.server_id);
                }
                _ => {}
            }
        }

        Ok(None)
    }
}
