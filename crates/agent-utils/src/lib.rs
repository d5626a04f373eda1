//! Shared utilities for equity agents
//!
//! This crate provides common functionality used across the workspace:
//! tracing initialisation and helpers for reading typed settings from the
//! environment.

pub mod config;
pub mod logging;

pub use config::{ConfigError, EnvSource, SystemEnv};
pub use logging::{LogFormat, init_tracing, init_tracing_json, try_init_tracing};
