// src/lib.rs
//! Call-control plane for the OneCall PBX: consumes ARI events, drives each
//! inbound call to an operator, records it and writes call history.

pub mod api;
pub mod ari;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod traits;
