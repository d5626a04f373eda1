//! Data, research and analyst specialists
//!
//! Each module holds the specialist's system prompt, its tool set, the task
//! builder and the extractor that turns a finished run into typed output.

pub mod analyst;
pub mod data;
pub mod research;

pub use analyst::AnalystExtractor;
pub use data::DataExtractor;
pub use research::ResearchExtractor;

use agent_core::ToolObservation;
use agent_runtime::ObservationMap;
use serde_json::Value;

/// Payload of a successful observation for `tool`
pub(crate) fn payload<'a>(observations: &'a ObservationMap, tool: &str) -> Option<&'a Value> {
    observations.get(tool).and_then(ToolObservation::payload)
}
