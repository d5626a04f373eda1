//! Reasoning backend abstraction layer
//!
//! This crate provides provider-agnostic abstractions for the reasoning step
//! of an agent loop. It includes:
//!
//! - Conversation message types
//! - The `ReasoningClient` contract (tool batch or final answer)
//! - Tool definitions advertised to the backend
//! - The `LLMProvider` trait and an adapter onto `ReasoningClient`
//! - A scripted client for deterministic tests
//! - Concrete provider implementations (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod reasoning;
pub mod scripted;
pub mod tools;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::{LLMProvider, ProviderReasoningClient, ReasoningConfig};
pub use reasoning::{Reasoning, ReasoningClient, ReasoningStep, estimate_tokens};
pub use scripted::{ScriptedClient, ScriptedTurn};
pub use tools::ToolDefinition;

// Provider implementations (feature-gated)
#[cfg(feature = "anthropic")]
pub mod providers;
