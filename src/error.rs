// src/error.rs
use thiserror::Error;
use actix_web::{http::StatusCode, ResponseError, HttpResponse};
use serde_json::json;

#[derive(Error, Debug)]
pub enum CallControlError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("ARI transport error: {0}")]
    AriTransport(String),

    #[error("ARI returned status {status} for {operation}")]
    AriStatus {
        operation: &'static str,
        status: u16,
    },

    #[error("ARI response missing field: {0}")]
    AriResponse(String),

    #[error("Event stream error: {0}")]
    EventStream(String),

    #[error("Invalid call state transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CallControlError>;

impl From<reqwest::Error> for CallControlError {
    fn from(err: reqwest::Error) -> Self {
        CallControlError::AriTransport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CallControlError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        CallControlError::EventStream(err.to_string())
    }
}

impl ResponseError for CallControlError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        HttpResponse::build(status_code).json(json!({
            "error": self.error_code(),
            "message": self.to_string(),
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            CallControlError::NotFound(_) => StatusCode::NOT_FOUND,
            CallControlError::AriTransport(_) | CallControlError::AriStatus { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl CallControlError {
    fn error_code(&self) -> &str {
        match self {
            CallControlError::Database(_) | CallControlError::Pool(_) => "database_error",
            CallControlError::Redis(_) | CallControlError::Cache(_) => "cache_error",
            CallControlError::Serialization(_) => "serialization_error",
            CallControlError::AriTransport(_) => "ari_transport_error",
            CallControlError::AriStatus { .. } => "ari_status_error",
            CallControlError::AriResponse(_) => "ari_response_error",
            CallControlError::EventStream(_) => "event_stream_error",
            CallControlError::InvalidTransition { .. } => "invalid_transition",
            CallControlError::NotFound(_) => "not_found",
            CallControlError::Config(_) => "config_error",
            CallControlError::Internal(_) => "internal_error",
        }
    }
}
