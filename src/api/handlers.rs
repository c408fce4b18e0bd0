// src/api/handlers.rs
use actix_web::{web, HttpResponse};
use crate::cache::CacheKeys;
use crate::error::CallControlError;
use crate::models::HealthResponse;
use crate::services::CallOrchestrator;
use std::sync::Arc;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "onecall-call-engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// In-flight call stored under `call:<channel_id>`, for debugging stuck calls.
pub async fn get_call(
    path: web::Path<String>,
    orchestrator: web::Data<Arc<CallOrchestrator>>,
) -> Result<HttpResponse, CallControlError> {
    let channel_id = path.into_inner();

    match orchestrator.store().by_channel(&channel_id).await {
        Some(attempt) => Ok(HttpResponse::Ok().json(attempt)),
        None => Err(CallControlError::NotFound(CacheKeys::call(&channel_id))),
    }
}

pub async fn stats(orchestrator: web::Data<Arc<CallOrchestrator>>) -> HttpResponse {
    HttpResponse::Ok().json(orchestrator.stats())
}
