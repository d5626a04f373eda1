//! The reasoning client contract used by the agent loop

use crate::{Message, Result, TokenUsage, ToolDefinition};
use agent_core::ToolInvocation;
use async_trait::async_trait;

/// What one reasoning turn decided
#[derive(Debug, Clone, PartialEq)]
pub enum ReasoningStep {
    /// One or more independent tool invocations to run before the next turn
    ToolBatch(Vec<ToolInvocation>),
    /// The final textual answer
    FinalAnswer(String),
}

/// Outcome of a reasoning call
#[derive(Debug, Clone, PartialEq)]
pub struct Reasoning {
    pub step: ReasoningStep,
    pub usage: TokenUsage,
}

impl Reasoning {
    pub fn tools(batch: Vec<ToolInvocation>, usage: TokenUsage) -> Self {
        Self {
            step: ReasoningStep::ToolBatch(batch),
            usage,
        }
    }

    pub fn answer(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            step: ReasoningStep::FinalAnswer(text.into()),
            usage,
        }
    }
}

/// Abstraction over a language-reasoning backend
///
/// Given a conversation and the tools on offer, a client returns either a
/// non-empty batch of tool invocations or a final answer. Implementations
/// must not touch orchestration state, and failures (rate limiting,
/// authentication, malformed responses) are reported as errors rather than as
/// an empty batch.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Run one reasoning turn
    async fn complete(&self, conversation: &[Message], tools: &[ToolDefinition])
    -> Result<Reasoning>;

    /// Model identifier, used for logging and cost accounting
    fn model(&self) -> &str;
}

/// Rough token estimate for a piece of text (about four characters per token)
pub fn estimate_tokens(chars: usize) -> usize {
    chars.div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(1), 1);
        assert_eq!(estimate_tokens(8), 2);
        assert_eq!(estimate_tokens(9), 3);
    }
}
