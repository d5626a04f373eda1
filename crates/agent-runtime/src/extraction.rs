//! Turning a finished run into typed output
//!
//! Every specialist declares how its output is produced. A deterministic
//! extractor builds the output from the observation map alone and never looks
//! at the final answer text. A generative extractor parses the final answer
//! and may fall back on observations for fields the answer leaves out.

use crate::run_state::ObservationMap;
use agent_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// How a specialist's output is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Projection of the observation map
    Deterministic,
    /// Parse of the final answer text
    Generative,
}

/// Produces a specialist's typed output
pub trait Extractor: Send + Sync {
    type Output: Send;

    fn strategy(&self) -> ExtractionStrategy;

    /// Build the output from observations alone
    ///
    /// Also used to salvage a partial output after a failed run.
    fn project(&self, subject: &str, _observations: &ObservationMap) -> Result<Self::Output> {
        Err(Error::OutputParse(format!(
            "no deterministic projection for {subject}"
        )))
    }

    /// Parse the final answer
    fn parse(
        &self,
        subject: &str,
        _answer: &str,
        _observations: &ObservationMap,
    ) -> Result<Self::Output> {
        Err(Error::OutputParse(format!("no answer parser for {subject}")))
    }

    /// Dispatch on the declared strategy
    fn extract(
        &self,
        subject: &str,
        answer: &str,
        observations: &ObservationMap,
    ) -> Result<Self::Output> {
        match self.strategy() {
            ExtractionStrategy::Deterministic => self.project(subject, observations),
            ExtractionStrategy::Generative => self.parse(subject, answer, observations),
        }
    }
}
