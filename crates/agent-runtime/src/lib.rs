//! Agent runtime for bounded, observable agent runs
//!
//! This crate provides the AgentExecutor for the reason-act-observe loop,
//! specialists that turn a run into typed output, one-shot agents for
//! tool-free calls, and the AgentRuntime that wires them to shared tools.

pub mod executor;
pub mod extraction;
pub mod oneshot;
pub mod run_state;
pub mod runtime;
pub mod specialist;

// Re-export key types
pub use executor::{
    AgentExecutor, AgentExecutorBuilder, ExecutorConfig, ExecutorEventHandler, NoOpEventHandler,
    RunOutcome,
};
pub use extraction::{ExtractionStrategy, Extractor};
pub use oneshot::OneShot;
pub use run_state::{ObservationMap, RunState};
pub use runtime::{AgentRuntime, AgentRuntimeBuilder};
pub use specialist::{AgentTask, SpecialistAgent, SpecialistOutcome};
