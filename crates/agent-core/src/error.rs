//! Error types for agent-core

use std::time::Duration;
use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
///
/// Tool-level variants (`ToolExecution`, `ToolNotFound`, `InvalidArguments`) are
/// recovered inside the reasoning loop and fed back as observations. The budget,
/// deadline and parse variants end a single agent run. `NoSymbolsResolved` ends a
/// whole request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A tool ran and reported a failure
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution {
        /// Tool name
        tool: String,
        /// Failure description
        message: String,
    },

    /// No tool with this name exists in the registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments did not match the tool's parameter schema
    #[error("Invalid arguments for '{tool}': {message}")]
    InvalidArguments {
        /// Tool name
        tool: String,
        /// What was wrong with the arguments
        message: String,
    },

    /// A tool with the same name is already registered
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// The reasoning loop ran out of iterations before a final answer
    #[error("Iteration budget exceeded after {max_iterations} iterations")]
    IterationBudgetExceeded {
        /// Configured maximum
        max_iterations: usize,
    },

    /// The cumulative token estimate went over budget
    #[error("Token budget exceeded: used {used} of {limit}")]
    TokenBudgetExceeded {
        /// Tokens consumed so far
        used: usize,
        /// Configured maximum
        limit: usize,
    },

    /// The final answer did not match the declared output schema
    #[error("Output parse error: {0}")]
    OutputParse(String),

    /// The caller-supplied deadline elapsed
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// The request did not name any resolvable symbol
    #[error("No symbols resolved: {0}")]
    NoSymbolsResolved(String),

    /// The reasoning backend failed (rate limit, auth, malformed response)
    #[error("Reasoning failed: {0}")]
    Reasoning(String),

    /// Agent initialization failed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),
}

impl Error {
    /// Create a tool execution error
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-arguments error
    pub fn invalid_arguments(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable label, used in logs and data-gap markers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolExecution { .. } => "tool_execution_error",
            Self::ToolNotFound(_) => "tool_not_found",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::DuplicateTool(_) => "duplicate_tool",
            Self::IterationBudgetExceeded { .. } => "iteration_budget_exceeded",
            Self::TokenBudgetExceeded { .. } => "token_budget_exceeded",
            Self::OutputParse(_) => "output_parse_error",
            Self::DeadlineExceeded(_) => "deadline_exceeded",
            Self::NoSymbolsResolved(_) => "no_symbols_resolved",
            Self::Reasoning(_) => "reasoning_error",
            Self::InitializationFailed(_) => "initialization_failed",
        }
    }

    /// Whether a run that failed with this error may still carry useful partial output
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            Self::IterationBudgetExceeded { .. }
                | Self::TokenBudgetExceeded { .. }
                | Self::DeadlineExceeded(_)
                | Self::OutputParse(_)
                | Self::Reasoning(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::tool("get_company_data", "store offline");
        assert_eq!(err.to_string(), "Tool 'get_company_data' failed: store offline");

        let err = Error::TokenBudgetExceeded {
            used: 1200,
            limit: 1000,
        };
        assert_eq!(err.to_string(), "Token budget exceeded: used 1200 of 1000");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(
            Error::DeadlineExceeded(Duration::from_secs(1)).kind(),
            "deadline_exceeded"
        );
        assert_eq!(Error::OutputParse("x".into()).kind(), "output_parse_error");
    }

    #[test]
    fn test_partial_classification() {
        assert!(Error::IterationBudgetExceeded { max_iterations: 3 }.is_partial());
        assert!(!Error::NoSymbolsResolved("empty".into()).is_partial());
        assert!(!Error::DuplicateTool("a".into()).is_partial());
    }
}
