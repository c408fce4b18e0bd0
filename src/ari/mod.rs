// src/ari/mod.rs
pub mod client;
pub mod connection;
pub mod event;
pub mod listener;

pub use client::AriClient;
pub use connection::AriEventStream;
pub use event::AriEvent;
pub use listener::AriListener;
