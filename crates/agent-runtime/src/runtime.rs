//! Runtime for building agents with dependency injection
//!
//! The AgentRuntime owns the shared tool registry and event handler, and
//! provides factory methods for the two kinds of agents: tool-using
//! specialists and tool-free one-shot agents. Each agent receives its own
//! reasoning client, so specialists can run on different models.

use crate::executor::{AgentExecutor, ExecutorConfig, ExecutorEventHandler, NoOpEventHandler};
use crate::extraction::Extractor;
use crate::oneshot::OneShot;
use crate::specialist::SpecialistAgent;
use agent_core::Result;
use agent_llm::ReasoningClient;
use agent_tools::{Tool, ToolRegistry};
use std::sync::Arc;
use tracing::info;

/// Shared resources for agent construction
///
/// # Example
///
/// ```no_run
/// use agent_runtime::{AgentRuntime, ExecutorConfig};
///
/// # fn example(extractor: impl agent_runtime::Extractor, client: std::sync::Arc<dyn agent_llm::ReasoningClient>) -> agent_core::Result<()> {
/// let runtime = AgentRuntime::builder().build();
/// let data = runtime.create_specialist(
///     client,
///     ExecutorConfig::default(),
///     &[],
///     extractor,
/// )?;
/// # Ok(())
/// # }
/// ```
pub struct AgentRuntime {
    tool_registry: Arc<ToolRegistry>,
    event_handler: Arc<dyn ExecutorEventHandler>,
}

impl AgentRuntime {
    /// Create a new agent runtime
    pub fn new(tool_registry: Arc<ToolRegistry>, event_handler: Arc<dyn ExecutorEventHandler>) -> Self {
        Self {
            tool_registry,
            event_handler,
        }
    }

    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    /// Get a reference to the tool registry
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    pub fn event_handler(&self) -> &Arc<dyn ExecutorEventHandler> {
        &self.event_handler
    }

    /// Create a tool-using specialist restricted to `tool_names`
    ///
    /// # Errors
    ///
    /// Returns `ToolNotFound` if a named tool is not registered.
    pub fn create_specialist<E: Extractor>(
        &self,
        client: Arc<dyn ReasoningClient>,
        config: ExecutorConfig,
        tool_names: &[&str],
        extractor: E,
    ) -> Result<SpecialistAgent<E>> {
        let tools = Arc::new(self.tool_registry.subset(tool_names)?);
        info!(
            agent = %config.name,
            tools = ?tools.names(),
            max_iterations = config.budget.max_iterations,
            max_tokens = config.budget.max_tokens,
            "Creating specialist"
        );
        let executor = AgentExecutor::new(client, tools, config)
            .with_event_handler(self.event_handler.clone());
        Ok(SpecialistAgent::new(executor, extractor))
    }

    /// Create a tool-free agent
    pub fn create_oneshot(&self, client: Arc<dyn ReasoningClient>, name: impl Into<String>) -> OneShot {
        OneShot::new(client, name).with_event_handler(self.event_handler.clone())
    }
}

/// Builder for AgentRuntime
pub struct AgentRuntimeBuilder {
    tool_registry: ToolRegistry,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentRuntimeBuilder {
    /// Create a new runtime builder
    pub fn new() -> Self {
        Self {
            tool_registry: ToolRegistry::new(),
            event_handler: None,
        }
    }

    /// Replace the tool registry
    pub fn tool_registry(mut self, registry: ToolRegistry) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Register one tool
    ///
    /// # Errors
    ///
    /// Returns `DuplicateTool` if the name is already taken.
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Result<Self> {
        self.tool_registry.register(tool)?;
        Ok(self)
    }

    /// Set the event handler
    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the runtime
    pub fn build(self) -> AgentRuntime {
        AgentRuntime::new(
            Arc::new(self.tool_registry),
            self.event_handler
                .unwrap_or_else(|| Arc::new(NoOpEventHandler)),
        )
    }
}

impl Default for AgentRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
