// src/api/routes.rs
use actix_web::web;
use crate::api::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(handlers::health_check))
            .route("/calls/{channel_id}", web::get().to(handlers::get_call))
            .route("/stats", web::get().to(handlers::stats))
    );
}
