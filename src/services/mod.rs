// src/services/mod.rs
pub mod call_orchestrator;
pub mod routing;

pub use call_orchestrator::{BestEffortFailure, CallOrchestrator, OrchestratorSettings};
pub use routing::CallRouter;
