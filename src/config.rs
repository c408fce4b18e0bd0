// src/config.rs
use std::env;
use std::time::Duration;

pub type ConfigResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub ari: AriConfig,
    pub recording: RecordingConfig,
}

/// Connection settings for the telephony engine's ARI surface.
#[derive(Debug, Clone)]
pub struct AriConfig {
    /// `host:port`, without scheme or trailing slash
    pub host: String,
    pub app: String,
    pub user: String,
    pub password: String,
    pub endpoint_tech: String,
    pub request_timeout: Duration,
    pub dial_timeout_secs: u32,
    pub reconnect_delay: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RecordingConfig {
    pub directory: String,
    pub format: String,
}

impl Config {
    pub fn from_env() -> ConfigResult<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "production".to_string()),
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "9000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            ari: AriConfig::from_env()?,
            recording: RecordingConfig {
                directory: env::var("RECORDING_DIR")
                    .unwrap_or_else(|_| "/var/spool/asterisk/recording".to_string()),
                format: env::var("RECORDING_FORMAT")
                    .unwrap_or_else(|_| "wav".to_string()),
            },
        })
    }
}

impl AriConfig {
    fn from_env() -> ConfigResult<Self> {
        let timeout_ms: u64 = env::var("ARI_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()?;

        let dial_timeout_secs: u32 = env::var("ARI_DIAL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?;

        let reconnect_delay = match env::var("ARI_RECONNECT_SECS") {
            Ok(secs) if !secs.is_empty() => Some(Duration::from_secs(secs.parse()?)),
            _ => None,
        };

        Ok(AriConfig {
            host: Self::normalize_host(
                &env::var("ARI_HOST").unwrap_or_else(|_| "localhost:8088".to_string()),
            ),
            app: env::var("ARI_APP").unwrap_or_else(|_| "onecall".to_string()),
            user: env::var("ARI_USER").unwrap_or_else(|_| "onecall".to_string()),
            password: env::var("ARI_PASSWORD").unwrap_or_else(|_| "11221122".to_string()),
            endpoint_tech: env::var("ARI_ENDPOINT_TECH").unwrap_or_else(|_| "PJSIP".to_string()),
            request_timeout: Duration::from_millis(timeout_ms),
            dial_timeout_secs,
            reconnect_delay,
        })
    }

    /// Strips scheme, trailing slashes and a trailing `/ari` so the host can
    /// be reused for both the REST base URL and the WebSocket URL.
    pub fn normalize_host(raw: &str) -> String {
        let host = raw
            .trim()
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .trim_end_matches('/');

        host.strip_suffix("/ari").unwrap_or(host).to_string()
    }

    /// Base URL of the REST control surface: `http://<host>/ari`
    pub fn rest_base_url(&self) -> String {
        format!("http://{}/ari", self.host)
    }

    /// Event stream URL for this application.
    pub fn events_url(&self) -> String {
        format!(
            "ws://{}/ari/events?api_key={}:{}&app={}",
            self.host, self.user, self.password, self.app
        )
    }
}

#[cfg(test)]
impl AriConfig {
    pub fn for_tests() -> Self {
        AriConfig {
            host: "localhost:8088".to_string(),
            app: "onecall".to_string(),
            user: "onecall".to_string(),
            password: "secret".to_string(),
            endpoint_tech: "PJSIP".to_string(),
            request_timeout: Duration::from_millis(500),
            dial_timeout_secs: 30,
            reconnect_delay: None,
        }
    }
}
