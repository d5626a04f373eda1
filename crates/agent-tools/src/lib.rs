//! Tool management and execution framework
//!
//! This crate provides the `Tool` trait, typed parameter schemas, and the
//! registry that maps tool names to executables.

pub mod registry;
pub mod schema;
pub mod tool;

pub use registry::{ToolRegistry, ToolSpec};
pub use schema::{ParamType, Parameter, ParameterSchema};
pub use tool::{Tool, parse_arguments};
