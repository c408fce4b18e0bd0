//! HTTP client for the ARI REST control surface
//!
//! One method per remote action. Every request carries the same basic-auth
//! credential pair and targets `http://<host>/ari`.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::config::AriConfig;
use crate::error::{CallControlError, Result};
use crate::traits::{ControlClient, OutboundChannelRequest};

/// Resource returned by `POST /bridges` and `POST /channels`
#[derive(Debug, Deserialize)]
struct CreatedResource {
    id: Option<String>,
}

/// Client for the telephony engine's REST API
pub struct AriClient {
    http_client: Client,
    base_url: String,
    user: String,
    password: String,
    recording_format: String,
}

impl AriClient {
    /// Creates a new client
    ///
    /// # Arguments
    ///
    /// * `config` - ARI host, credentials and request timeout
    /// * `recording_format` - Format requested when a bridge recording starts
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let client = AriClient::new(&config.ari, "wav")?;
    /// let bridge_id = client.create_bridge().await?;
    /// ```
    pub fn new(config: &AriConfig, recording_format: &str) -> Result<Self> {
        let http_client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(20)
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| CallControlError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.rest_base_url(),
            user: config.user.clone(),
            password: config.password.clone(),
            recording_format: recording_format.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http_client
            .post(self.url(path))
            .basic_auth(&self.user, Some(&self.password))
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.http_client
            .delete(self.url(path))
            .basic_auth(&self.user, Some(&self.password))
    }

    /// Sends the request and maps non-2xx statuses to `AriStatus`
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            error!("ARI {} failed: status={}", operation, status);
            return Err(CallControlError::AriStatus {
                operation,
                status: status.as_u16(),
            });
        }

        debug!("ARI {} ok: status={}", operation, status);
        Ok(response)
    }

    async fn execute_create(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<String> {
        let response = self.execute(operation, request).await?;
        let created: CreatedResource = response
            .json()
            .await
            .map_err(|e| CallControlError::AriResponse(format!("{}: {}", operation, e)))?;

        created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CallControlError::AriResponse(format!("{}: id", operation)))
    }
}

#[async_trait]
impl ControlClient for AriClient {
    #[instrument(skip(self))]
    async fn indicate_ringing(&self, channel_id: &str) -> Result<()> {
        self.execute("ring", self.post(&format!("channels/{}/ring", channel_id)))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn create_bridge(&self) -> Result<String> {
        let body = json!({
            "type": "mixing",
            "name": format!("br-{}", Uuid::new_v4().simple()),
        });

        self.execute_create("create_bridge", self.post("bridges").json(&body))
            .await
    }

    #[instrument(skip(self), fields(endpoint = %request.endpoint))]
    async fn create_outbound_channel(&self, request: &OutboundChannelRequest) -> Result<String> {
        let body = json!({
            "endpoint": request.endpoint,
            "app": request.app,
            "appArgs": request.app_args,
            "callerId": request.caller_id,
            "timeout": request.timeout_secs,
        });

        self.execute_create("create_channel", self.post("channels").json(&body))
            .await
    }

    #[instrument(skip(self))]
    async fn answer(&self, channel_id: &str) -> Result<()> {
        self.execute("answer", self.post(&format!("channels/{}/answer", channel_id)))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn add_to_bridge(&self, bridge_id: &str, channel_id: &str) -> Result<()> {
        let body = json!({ "channel": channel_id });
        self.execute(
            "add_channel",
            self.post(&format!("bridges/{}/addChannel", bridge_id)).json(&body),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn start_recording(&self, bridge_id: &str, name: &str) -> Result<()> {
        let body = json!({
            "name": name,
            "format": self.recording_format,
            "ifExists": "overwrite",
        });
        self.execute(
            "record",
            self.post(&format!("bridges/{}/record", bridge_id)).json(&body),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn hangup(&self, channel_id: &str) -> Result<()> {
        if channel_id.is_empty() {
            return Ok(());
        }
        self.execute("hangup", self.delete(&format!("channels/{}", channel_id)))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn destroy_bridge(&self, bridge_id: &str) -> Result<()> {
        if bridge_id.is_empty() {
            return Ok(());
        }
        self.execute("destroy_bridge", self.delete(&format!("bridges/{}", bridge_id)))
            .await
            .map(|_| ())
    }
}
