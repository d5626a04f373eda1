//! Execution-scoped state of one agent run

use agent_core::{ToolInvocation, ToolObservation};
use agent_llm::Message;
use std::collections::BTreeMap;

/// Latest observation per tool name
pub type ObservationMap = BTreeMap<String, ToolObservation>;

/// Mutable record owned by a single executor run
///
/// Created when a run starts and handed back to the caller by value when it
/// ends, so no two runs ever share observations.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    conversation: Vec<Message>,
    observations: ObservationMap,
    iterations: usize,
    tokens_used: usize,
    terminal: bool,
    /// Observations of the batch being executed, by batch position
    in_flight: Vec<Option<ToolObservation>>,
}

impl RunState {
    /// Start a run from a task description
    pub fn new(task: impl Into<String>) -> Self {
        Self::from_conversation(vec![Message::user(task)])
    }

    /// Start a run from an existing conversation
    pub fn from_conversation(conversation: Vec<Message>) -> Self {
        Self {
            conversation,
            ..Self::default()
        }
    }

    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    pub fn observations(&self) -> &ObservationMap {
        &self.observations
    }

    pub fn into_observations(self) -> ObservationMap {
        self.observations
    }

    /// Completed reason-act-observe iterations
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Cumulative token estimate
    pub fn tokens_used(&self) -> usize {
        self.tokens_used
    }

    /// Whether the run produced a final answer
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub(crate) fn record_usage(&mut self, tokens: usize) {
        self.tokens_used = self.tokens_used.saturating_add(tokens);
    }

    pub(crate) fn record_request(&mut self, batch: &[ToolInvocation]) {
        self.conversation.push(Message::tool_requests(batch));
    }

    /// Merge a completed batch
    ///
    /// Observations are applied in batch order, so a later observation for the
    /// same tool name replaces an earlier one. The batch is appended to the
    /// conversation as one turn and the iteration counter advances.
    pub fn merge(&mut self, observations: Vec<ToolObservation>) {
        self.conversation.push(Message::observations(&observations));
        for observation in observations {
            self.observations
                .insert(observation.tool_name.clone(), observation);
        }
        self.iterations += 1;
    }

    pub(crate) fn begin_batch(&mut self, len: usize) {
        self.in_flight = vec![None; len];
    }

    /// Record one finished invocation of the current batch
    pub(crate) fn settle(&mut self, index: usize, observation: ToolObservation) {
        if let Some(slot) = self.in_flight.get_mut(index) {
            *slot = Some(observation);
        }
    }

    /// Merge the current batch once every invocation has settled
    pub(crate) fn complete_batch(&mut self) {
        let observations = std::mem::take(&mut self.in_flight).into_iter().flatten().collect();
        self.merge(observations);
    }

    /// Keep what an interrupted batch had finished
    ///
    /// Settled observations are merged in batch order and the unfinished ones
    /// are dropped. The iteration counter does not advance. Returns how many
    /// observations were kept.
    pub(crate) fn abandon_batch(&mut self) -> usize {
        let settled: Vec<ToolObservation> = std::mem::take(&mut self.in_flight)
            .into_iter()
            .flatten()
            .collect();
        if settled.is_empty() {
            return 0;
        }
        self.conversation.push(Message::observations(&settled));
        let kept = settled.len();
        for observation in settled {
            self.observations
                .insert(observation.tool_name.clone(), observation);
        }
        kept
    }

    pub(crate) fn finish(&mut self, answer: &str) {
        self.conversation.push(Message::assistant(answer));
        self.terminal = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{FailureKind, ToolFailure};
    use serde_json::json;

    fn observe(id: &str, tool: &str, value: serde_json::Value) -> ToolObservation {
        ToolObservation::success(&ToolInvocation::with_id(id, tool, json!({})), value)
    }

    #[test]
    fn test_merge_last_write_wins_across_batches() {
        let mut state = RunState::new("task");
        state.merge(vec![observe("1", "quote", json!(1)), observe("2", "peers", json!([]))]);
        state.merge(vec![observe("3", "quote", json!(2))]);

        assert_eq!(state.observations().len(), 2);
        assert_eq!(state.observations()["quote"].payload(), Some(&json!(2)));
        assert_eq!(state.iterations(), 2);
        // task + two observation turns
        assert_eq!(state.conversation().len(), 3);
    }

    #[test]
    fn test_merge_last_write_wins_within_batch() {
        let mut state = RunState::new("task");
        let failed = ToolObservation::failure(
            &ToolInvocation::with_id("2", "quote", json!({})),
            ToolFailure::new(FailureKind::Execution, "offline"),
        );
        state.merge(vec![observe("1", "quote", json!(1)), failed.clone()]);

        assert_eq!(state.observations().len(), 1);
        assert_eq!(state.observations()["quote"], failed);
    }

    #[test]
    fn test_usage_and_finish() {
        let mut state = RunState::new("task");
        state.record_usage(40);
        state.record_usage(60);
        assert_eq!(state.tokens_used(), 100);
        assert!(!state.is_terminal());

        state.finish("done");
        assert!(state.is_terminal());
        assert_eq!(state.conversation().last().and_then(Message::text), Some("done"));
    }

    #[test]
    fn test_abandoned_batch_keeps_settled_observations() {
        let mut state = RunState::new("task");
        state.begin_batch(3);
        state.settle(2, observe("c", "peers", json!([])));
        state.settle(0, observe("a", "quote", json!(1)));

        assert_eq!(state.abandon_batch(), 2);
        assert_eq!(state.observations().len(), 2);
        assert!(!state.observations().contains_key("profile"));
        assert_eq!(state.iterations(), 0);
        assert_eq!(state.abandon_batch(), 0);
    }

    #[test]
    fn test_completed_batch_merges_in_batch_order() {
        let mut state = RunState::new("task");
        state.begin_batch(2);
        state.settle(1, observe("b", "quote", json!(2)));
        state.settle(0, observe("a", "quote", json!(1)));
        state.complete_batch();

        assert_eq!(state.observations()["quote"].payload(), Some(&json!(2)));
        assert_eq!(state.iterations(), 1);
    }
}
