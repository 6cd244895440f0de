//! Debate runner: personas, completion service client, and the turn loop
//! that drives the `orchestration` core against a live language model.

pub mod completion;
pub mod config;
pub mod orchestrator;
pub mod personas;

pub use completion::{
    Completion, CompletionError, CompletionRequest, CompletionService, HttpCompletionService,
};
pub use config::{CallParams, RunnerConfig, ServiceEndpoint};
pub use orchestrator::DebateOrchestrator;
