//! Core abstractions for the equity agent workspace
//!
//! This crate defines the types shared by every layer: the error taxonomy,
//! tool invocations and observations, and run budgets.

pub mod budget;
pub mod error;
pub mod invocation;

pub use budget::Budget;
pub use error::{Error, Result};
pub use invocation::{FailureKind, ToolFailure, ToolInvocation, ToolObservation};
