//! Iteration and token limits for a single agent run

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Limits applied to one reasoning loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Maximum number of reasoning turns
    pub max_iterations: usize,
    /// Maximum cumulative token estimate across all turns
    pub max_tokens: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_tokens: 100_000,
        }
    }
}

impl Budget {
    pub fn new(max_iterations: usize, max_tokens: usize) -> Self {
        Self {
            max_iterations,
            max_tokens,
        }
    }

    /// Fails once `completed` iterations have used up the allowance
    pub fn check_iterations(&self, completed: usize) -> Result<()> {
        if completed >= self.max_iterations {
            return Err(Error::IterationBudgetExceeded {
                max_iterations: self.max_iterations,
            });
        }
        Ok(())
    }

    /// Fails when `used` is over the token allowance
    pub fn check_tokens(&self, used: usize) -> Result<()> {
        if used > self.max_tokens {
            return Err(Error::TokenBudgetExceeded {
                used,
                limit: self.max_tokens,
            });
        }
        Ok(())
    }
}
