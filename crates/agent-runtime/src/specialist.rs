//! Specialist agents: a bounded executor paired with an extractor

use crate::executor::{AgentExecutor, RunOutcome};
use crate::extraction::{ExtractionStrategy, Extractor};
use crate::run_state::ObservationMap;
use agent_core::{Error, Result};
use tracing::{info, warn};

/// Input handed to a specialist
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTask {
    /// What the run is about, usually a ticker symbol
    pub subject: String,
    /// Instruction for the reasoning client
    pub instruction: String,
    /// Digest of earlier work, appended to the instruction
    pub context: Option<String>,
}

impl AgentTask {
    pub fn new(subject: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            instruction: instruction.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The opening user message
    pub fn prompt(&self) -> String {
        match &self.context {
            Some(context) if !context.is_empty() => {
                format!("{}\n\nContext:\n{}", self.instruction, context)
            }
            _ => self.instruction.clone(),
        }
    }
}

/// What a specialist run produced
///
/// `observations` is always populated with whatever the run gathered, so a
/// caller can salvage a partial result when `result` is an error.
#[derive(Debug)]
pub struct SpecialistOutcome<T> {
    pub agent: String,
    pub subject: String,
    pub strategy: ExtractionStrategy,
    pub result: Result<T>,
    pub observations: ObservationMap,
    pub iterations: usize,
    pub tokens_used: usize,
}

impl<T> SpecialistOutcome<T> {
    pub fn output(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }

    /// Stopped early but may carry usable observations
    pub fn is_partial(&self) -> bool {
        self.error().is_some_and(Error::is_partial)
    }
}

/// A bounded reasoning loop plus the rule that turns its run into output
pub struct SpecialistAgent<E: Extractor> {
    executor: AgentExecutor,
    extractor: E,
}

impl<E: Extractor> SpecialistAgent<E> {
    pub fn new(executor: AgentExecutor, extractor: E) -> Self {
        Self {
            executor,
            extractor,
        }
    }

    pub fn name(&self) -> &str {
        self.executor.name()
    }

    pub fn strategy(&self) -> ExtractionStrategy {
        self.extractor.strategy()
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }

    /// Run the loop and extract typed output
    pub async fn run(&self, task: AgentTask) -> SpecialistOutcome<E::Output> {
        info!(
            agent = %self.name(),
            subject = %task.subject,
            strategy = ?self.strategy(),
            "Specialist started"
        );

        let RunOutcome { result, state } = self.executor.run(task.prompt()).await;
        let result = result.and_then(|answer| {
            self.extractor
                .extract(&task.subject, &answer, state.observations())
        });

        if let Err(e) = &result {
            warn!(
                agent = %self.name(),
                subject = %task.subject,
                error = %e,
                "Specialist did not produce output"
            );
        }

        let iterations = state.iterations();
        let tokens_used = state.tokens_used();
        SpecialistOutcome {
            agent: self.name().to_string(),
            subject: task.subject,
            strategy: self.strategy(),
            result,
            observations: state.into_observations(),
            iterations,
            tokens_used,
        }
    }
}
