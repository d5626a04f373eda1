//! Agent executor for running bounded agent loops
//!
//! The AgentExecutor implements the reason-act-observe loop:
//! 1. Check the iteration budget and ask the reasoning client for a step
//! 2. On a final answer, stop
//! 3. On a tool batch, run every invocation concurrently and merge the
//!    observations into the run state
//! 4. Check the token budget and loop back
//!
//! A run never panics on budget exhaustion, deadline expiry or a failing
//! client: it ends with an error and hands the partial state back.

use crate::run_state::RunState;
use agent_core::{Budget, Error, Result, ToolFailure, ToolInvocation, ToolObservation};
use agent_llm::{Message, ReasoningClient, ReasoningStep, TokenUsage, ToolDefinition};
use agent_tools::ToolRegistry;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Event handler for agent execution events
///
/// Implement this trait to receive callbacks during agent execution, for
/// example to account for token usage or stream tool status to a client.
#[async_trait]
pub trait ExecutorEventHandler: Send + Sync {
    /// Called after every reasoning turn
    async fn on_reasoning(
        &self,
        _agent: &str,
        _model: &str,
        _usage: &TokenUsage,
        _duration_ms: u64,
    ) {
    }

    /// Called when a tool execution starts
    async fn on_tool_start(&self, _agent: &str, _id: &str, _name: &str, _input: &Value) {}

    /// Called when a tool execution completes
    async fn on_tool_done(
        &self,
        _agent: &str,
        _id: &str,
        _name: &str,
        _result: std::result::Result<&Value, &str>,
        _duration_ms: u64,
    ) {
    }

    /// Called when the agent completes
    async fn on_complete(&self, _agent: &str, _answer: &str) {}

    /// Called when a run ends with an error
    async fn on_error(&self, _agent: &str, _error: &str) {}
}

/// No-op event handler for when events are not needed
pub struct NoOpEventHandler;

#[async_trait]
impl ExecutorEventHandler for NoOpEventHandler {}

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Agent name used in logs and events
    pub name: String,

    /// Iteration and token limits
    pub budget: Budget,

    /// Wall-clock limit for the whole run
    pub deadline: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: "agent".to_string(),
            budget: Budget::default(),
            deadline: None,
        }
    }
}

/// Result of one run together with the state it left behind
#[derive(Debug)]
pub struct RunOutcome {
    pub result: Result<String>,
    pub state: RunState,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Executes a bounded agent loop: reasoning → tool batch → observations → loop back
pub struct AgentExecutor {
    client: Arc<dyn ReasoningClient>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Arc<dyn ExecutorEventHandler>,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        client: Arc<dyn ReasoningClient>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            client,
            tool_registry,
            config,
            event_handler: Arc::new(NoOpEventHandler),
        }
    }

    /// Set the event handler for receiving execution events
    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = handler;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tool_registry
    }

    /// Execute the agent loop for a task
    pub async fn run(&self, task: impl Into<String>) -> RunOutcome {
        self.run_conversation(vec![Message::user(task)]).await
    }

    /// Execute the agent loop from an existing conversation
    pub async fn run_conversation(&self, conversation: Vec<Message>) -> RunOutcome {
        let mut state = RunState::from_conversation(conversation);

        let result = match self.config.deadline {
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, self.drive(&mut state)).await;
                outcome.unwrap_or_else(|_| {
                    let kept = state.abandon_batch();
                    debug!(
                        agent = %self.config.name,
                        kept_observations = kept,
                        "Deadline hit, in-flight tools abandoned"
                    );
                    Err(Error::DeadlineExceeded(limit))
                })
            }
            None => self.drive(&mut state).await,
        };

        match &result {
            Ok(answer) => {
                info!(
                    agent = %self.config.name,
                    iterations = state.iterations(),
                    tokens_used = state.tokens_used(),
                    response_length = answer.len(),
                    "Agent completed naturally"
                );
                self.event_handler
                    .on_complete(&self.config.name, answer)
                    .await;
            }
            Err(e) => {
                warn!(
                    agent = %self.config.name,
                    iterations = state.iterations(),
                    tokens_used = state.tokens_used(),
                    observations = state.observations().len(),
                    error = %e,
                    "Agent stopped without a final answer"
                );
                self.event_handler
                    .on_error(&self.config.name, &e.to_string())
                    .await;
            }
        }

        RunOutcome { result, state }
    }

    async fn drive(&self, state: &mut RunState) -> Result<String> {
        let tools: Vec<ToolDefinition> = agent_llm::tools::definitions(&self.tool_registry);
        debug!(tool_count = tools.len(), "Available tools");

        loop {
            self.config.budget.check_iterations(state.iterations())?;

            info!(
                agent = %self.config.name,
                iteration = state.iterations() + 1,
                max_iterations = self.config.budget.max_iterations,
                "Agent iteration started"
            );

            let started = Instant::now();
            let reasoning = self.client.complete(state.conversation(), &tools).await?;
            let duration_ms = elapsed_ms(started);
            state.record_usage(reasoning.usage.total());

            info!(
                model = %self.client.model(),
                input_tokens = reasoning.usage.input_tokens,
                output_tokens = reasoning.usage.output_tokens,
                tokens_used = state.tokens_used(),
                duration_ms,
                "Reasoning response received"
            );
            self.event_handler
                .on_reasoning(
                    &self.config.name,
                    self.client.model(),
                    &reasoning.usage,
                    duration_ms,
                )
                .await;

            match reasoning.step {
                ReasoningStep::FinalAnswer(answer) => {
                    let preview: String = answer.chars().take(300).collect();
                    debug!(response_preview = %preview, "Final answer preview");
                    state.finish(&answer);
                    return Ok(answer);
                }
                ReasoningStep::ToolBatch(batch) => {
                    if batch.is_empty() {
                        return Err(Error::Reasoning(
                            "reasoning client returned an empty tool batch".to_string(),
                        ));
                    }
                    info!(tool_count = batch.len(), "Agent requested tool use");

                    state.record_request(&batch);
                    self.execute_batch(&batch, state).await;

                    self.config.budget.check_tokens(state.tokens_used())?;
                }
            }
        }
    }

    /// Run every invocation of a batch concurrently
    ///
    /// Each observation is settled into the run state as soon as it finishes,
    /// so an interrupted batch still keeps its finished calls. The merge
    /// happens in batch order regardless of completion order.
    /// Invocations in one batch must not depend on each other's results; a
    /// call that needs another's output belongs in a later turn.
    async fn execute_batch(&self, batch: &[ToolInvocation], state: &mut RunState) {
        info!(tool_count = batch.len(), "Starting tool execution");
        state.begin_batch(batch.len());

        let mut pending: FuturesUnordered<_> = batch
            .iter()
            .enumerate()
            .map(|(index, invocation)| async move { (index, self.execute_tool(invocation).await) })
            .collect();
        while let Some((index, observation)) = pending.next().await {
            state.settle(index, observation);
        }

        state.complete_batch();
    }

    async fn execute_tool(&self, invocation: &ToolInvocation) -> ToolObservation {
        let input_preview: String = invocation.arguments.to_string().chars().take(500).collect();
        info!(
            tool_name = %invocation.name,
            tool_id = %invocation.id,
            input_preview = %input_preview,
            "Executing tool"
        );
        self.event_handler
            .on_tool_start(
                &self.config.name,
                &invocation.id,
                &invocation.name,
                &invocation.arguments,
            )
            .await;

        let start_time = Instant::now();
        let outcome = self.invoke(invocation).await;
        let duration_ms = elapsed_ms(start_time);

        match outcome {
            Ok(result) => {
                let result_str = result.to_string();
                let result_preview: String = result_str.chars().take(500).collect();
                info!(
                    tool_name = %invocation.name,
                    duration_ms,
                    result_length = result_str.len(),
                    result_preview = %result_preview,
                    "Tool execution succeeded"
                );
                self.event_handler
                    .on_tool_done(
                        &self.config.name,
                        &invocation.id,
                        &invocation.name,
                        Ok(&result),
                        duration_ms,
                    )
                    .await;
                ToolObservation::success(invocation, result)
            }
            Err(e) => {
                warn!(
                    tool_name = %invocation.name,
                    duration_ms,
                    error = %e,
                    "Tool execution failed"
                );
                let failure = ToolFailure::from(e);
                self.event_handler
                    .on_tool_done(
                        &self.config.name,
                        &invocation.id,
                        &invocation.name,
                        Err(&failure.message),
                        duration_ms,
                    )
                    .await;
                ToolObservation::failure(invocation, failure)
            }
        }
    }

    async fn invoke(&self, invocation: &ToolInvocation) -> Result<Value> {
        let spec = self.tool_registry.spec(&invocation.name)?;
        spec.schema()
            .validate(&invocation.name, &invocation.arguments)?;
        spec.tool().execute(invocation.arguments.clone()).await
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    client: Option<Arc<dyn ReasoningClient>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
    event_handler: Option<Arc<dyn ExecutorEventHandler>>,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            client: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
            event_handler: None,
        }
    }

    /// Set the reasoning client
    pub fn client(mut self, client: Arc<dyn ReasoningClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.budget.max_iterations = max;
        self
    }

    /// Set the cumulative token budget
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.budget.max_tokens = max_tokens;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = Some(deadline);
        self
    }

    pub fn event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let client = self.client.ok_or_else(|| {
            Error::InitializationFailed("Reasoning client not set".to_string())
        })?;

        let executor = AgentExecutor::new(client, self.tool_registry, self.config);
        Ok(match self.event_handler {
            Some(handler) => executor.with_event_handler(handler),
            None => executor,
        })
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::FailureKind;
    use agent_llm::{ScriptedClient, ScriptedTurn};
    use agent_tools::{ParamType, ParameterSchema, Tool};
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DelayTool {
        name: &'static str,
        delay: Duration,
    }

    #[async_trait]
    impl Tool for DelayTool {
        async fn execute(&self, arguments: Value) -> Result<Value> {
            tokio::time::sleep(self.delay).await;
            Ok(json!({"tool": self.name, "symbol": arguments["symbol"]}))
        }

        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Sleeps, then echoes the symbol"
        }

        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::new().required("symbol", ParamType::String, "Ticker symbol")
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        async fn execute(&self, _arguments: Value) -> Result<Value> {
            Err(Error::tool("get_report_text", "upstream unavailable"))
        }

        fn name(&self) -> &str {
            "get_report_text"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::new()
        }
    }

    fn registry(delays: [u64; 3]) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for (name, ms) in ["quote", "profile", "peers"].into_iter().zip(delays) {
            registry
                .register(Arc::new(DelayTool {
                    name,
                    delay: Duration::from_millis(ms),
                }))
                .unwrap();
        }
        registry.register(Arc::new(FailingTool)).unwrap();
        Arc::new(registry)
    }

    fn executor(client: ScriptedClient, tools: Arc<ToolRegistry>) -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
            .client(Arc::new(client))
            .tool_registry(tools)
            .name("data")
    }

    fn fixed_batch() -> ScriptedTurn {
        ScriptedTurn::Tools(vec![
            ToolInvocation::with_id("a", "quote", json!({"symbol": "PPL"})),
            ToolInvocation::with_id("b", "profile", json!({"symbol": "PPL"})),
            ToolInvocation::with_id("c", "peers", json!({"symbol": "PPL"})),
        ])
    }

    #[test]
    fn test_builder() {
        let builder = AgentExecutorBuilder::new()
            .name("research")
            .max_iterations(5)
            .max_tokens(1_000)
            .deadline(Duration::from_secs(3));

        assert_eq!(builder.config.name, "research");
        assert_eq!(builder.config.budget, Budget::new(5, 1_000));
        assert_eq!(builder.config.deadline, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_builder_requires_client() {
        let err = AgentExecutorBuilder::new().build().err().unwrap();
        assert!(matches!(err, Error::InitializationFailed(_)));
    }

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.budget.max_iterations, 10);
        assert_eq!(config.deadline, None);
    }

    #[tokio::test]
    async fn test_immediate_answer() {
        let client = ScriptedClient::new().then_answer("nothing to do");
        let executor = executor(client, registry([0, 0, 0])).build().unwrap();

        let outcome = executor.run("Summarize PPL").await;
        assert_eq!(outcome.result.unwrap(), "nothing to do");
        assert_eq!(outcome.state.iterations(), 0);
        assert!(outcome.state.observations().is_empty());
        assert!(outcome.state.is_terminal());
    }

    #[tokio::test]
    async fn test_batch_then_answer() {
        let client = ScriptedClient::new().then(fixed_batch()).then_answer("done");
        let executor = executor(client, registry([0, 0, 0])).build().unwrap();

        let outcome = executor.run("Get data for PPL").await;
        assert_eq!(outcome.result.unwrap(), "done");

        let state = outcome.state;
        assert_eq!(state.iterations(), 1);
        assert_eq!(state.observations().len(), 3);
        assert_eq!(
            state.observations()["quote"].payload(),
            Some(&json!({"tool": "quote", "symbol": "PPL"}))
        );
        // task, tool requests, observations, answer
        assert_eq!(state.conversation().len(), 4);
    }

    #[tokio::test]
    async fn test_tool_failures_become_observations() {
        let client = ScriptedClient::new()
            .then(ScriptedTurn::Tools(vec![
                ToolInvocation::with_id("a", "missing_tool", json!({})),
                ToolInvocation::with_id("b", "quote", json!({})),
                ToolInvocation::with_id("c", "get_report_text", json!({})),
            ]))
            .then_answer("done anyway");
        let executor = executor(client, registry([0, 0, 0])).build().unwrap();

        let outcome = executor.run("PPL").await;
        assert!(outcome.is_success());

        let observations = outcome.state.observations();
        let kind = |name: &str| observations[name].failure_info().map(|f| f.kind);
        assert_eq!(kind("missing_tool"), Some(FailureKind::NotFound));
        assert_eq!(kind("quote"), Some(FailureKind::InvalidArguments));
        assert_eq!(kind("get_report_text"), Some(FailureKind::Execution));
    }

    #[tokio::test]
    async fn test_iteration_budget_bounds_reasoning_turns() {
        let client = Arc::new(
            ScriptedClient::new()
                .otherwise(ScriptedTurn::tools([("quote", json!({"symbol": "PPL"}))])),
        );
        let executor = AgentExecutorBuilder::new()
            .client(client.clone())
            .tool_registry(registry([0, 0, 0]))
            .max_iterations(3)
            .build()
            .unwrap();

        let outcome = executor.run("PPL").await;
        assert_eq!(
            outcome.result.unwrap_err(),
            Error::IterationBudgetExceeded { max_iterations: 3 }
        );
        assert_eq!(client.calls(), 3);
        assert_eq!(outcome.state.iterations(), 3);
        assert_eq!(outcome.state.observations().len(), 1);
    }

    #[tokio::test]
    async fn test_token_budget() {
        let client = Arc::new(
            ScriptedClient::new()
                .otherwise(ScriptedTurn::tools([("quote", json!({"symbol": "PPL"}))]))
                .with_usage(TokenUsage::new(500, 100)),
        );
        let executor = AgentExecutorBuilder::new()
            .client(client.clone())
            .tool_registry(registry([0, 0, 0]))
            .max_tokens(1_000)
            .build()
            .unwrap();

        let outcome = executor.run("PPL").await;
        assert_eq!(
            outcome.result.unwrap_err(),
            Error::TokenBudgetExceeded {
                used: 1_200,
                limit: 1_000
            }
        );
        assert_eq!(client.calls(), 2);
        assert_eq!(outcome.state.observations().len(), 1);
    }

    #[tokio::test]
    async fn test_final_answer_wins_over_token_budget() {
        let client = ScriptedClient::new()
            .then_answer("done")
            .with_usage(TokenUsage::new(5_000, 5_000));
        let executor = executor(client, registry([0, 0, 0]))
            .max_tokens(100)
            .build()
            .unwrap();

        assert_eq!(executor.run("PPL").await.result.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_deadline_keeps_partial_observations() {
        let client = ScriptedClient::new()
            .then(ScriptedTurn::Tools(vec![ToolInvocation::with_id(
                "a",
                "quote",
                json!({"symbol": "PPL"}),
            )]))
            .then(ScriptedTurn::Tools(vec![ToolInvocation::with_id(
                "b",
                "peers",
                json!({"symbol": "PPL"}),
            )]))
            .then_answer("never reached");
        let executor = executor(client, registry([0, 0, 5_000]))
            .deadline(Duration::from_millis(200))
            .build()
            .unwrap();

        let outcome = executor.run("PPL").await;
        assert_eq!(
            outcome.result.unwrap_err(),
            Error::DeadlineExceeded(Duration::from_millis(200))
        );
        assert_eq!(outcome.state.iterations(), 1);
        assert!(outcome.state.observations().contains_key("quote"));
        assert!(!outcome.state.observations().contains_key("peers"));
    }

    #[tokio::test]
    async fn test_deadline_keeps_finished_calls_of_the_same_batch() {
        let client = ScriptedClient::new()
            .then(ScriptedTurn::Tools(vec![
                ToolInvocation::with_id("a", "quote", json!({"symbol": "PPL"})),
                ToolInvocation::with_id("b", "peers", json!({"symbol": "PPL"})),
            ]))
            .then_answer("never reached");
        let executor = executor(client, registry([0, 0, 5_000]))
            .deadline(Duration::from_millis(200))
            .build()
            .unwrap();

        let outcome = executor.run("PPL").await;
        assert_eq!(
            outcome.result.unwrap_err(),
            Error::DeadlineExceeded(Duration::from_millis(200))
        );
        let observations = outcome.state.observations();
        assert_eq!(
            observations["quote"].payload(),
            Some(&json!({"tool": "quote", "symbol": "PPL"}))
        );
        assert!(!observations.contains_key("peers"));
        assert_eq!(outcome.state.iterations(), 0);
    }

    #[tokio::test]
    async fn test_batch_runs_concurrently() {
        let client = ScriptedClient::new().then(fixed_batch()).then_answer("done");
        let executor = executor(client, registry([300, 300, 300])).build().unwrap();

        let started = Instant::now();
        let outcome = executor.run("PPL").await;
        assert!(outcome.is_success());
        assert!(started.elapsed() < Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_completion_order_does_not_change_observations() {
        let mut maps = Vec::new();
        for delays in [[10, 60, 120], [120, 60, 10], [60, 10, 120]] {
            let client = ScriptedClient::new().then(fixed_batch()).then_answer("done");
            let executor = executor(client, registry(delays)).build().unwrap();
            maps.push(executor.run("PPL").await.state.into_observations());
        }
        assert_eq!(maps[0], maps[1]);
        assert_eq!(maps[1], maps[2]);
    }

    #[tokio::test]
    async fn test_reasoning_failure_is_reported() {
        let client = ScriptedClient::new().then(ScriptedTurn::fail("overloaded"));
        let executor = executor(client, registry([0, 0, 0])).build().unwrap();

        let outcome = executor.run("PPL").await;
        assert!(matches!(outcome.result, Err(Error::Reasoning(ref m)) if m.contains("overloaded")));
    }

    #[derive(Default)]
    struct RecordingHandler {
        reasoning_turns: AtomicUsize,
        tools: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ExecutorEventHandler for RecordingHandler {
        async fn on_reasoning(&self, _agent: &str, _model: &str, _usage: &TokenUsage, _ms: u64) {
            self.reasoning_turns.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_tool_done(
            &self,
            agent: &str,
            _id: &str,
            name: &str,
            _result: std::result::Result<&Value, &str>,
            _duration_ms: u64,
        ) {
            self.tools.lock().unwrap().push(format!("{agent}:{name}"));
        }

        async fn on_error(&self, _agent: &str, error: &str) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    #[tokio::test]
    async fn test_event_handler_receives_events() {
        let handler = Arc::new(RecordingHandler::default());
        let client = ScriptedClient::new()
            .then_tools([("quote", json!({"symbol": "PPL"}))])
            .then(ScriptedTurn::fail("boom"));
        let executor = executor(client, registry([0, 0, 0]))
            .event_handler(handler.clone())
            .build()
            .unwrap();

        let outcome = executor.run("PPL").await;
        assert!(!outcome.is_success());
        assert_eq!(handler.reasoning_turns.load(Ordering::SeqCst), 1);
        assert_eq!(*handler.tools.lock().unwrap(), vec!["data:quote".to_string()]);
        assert_eq!(handler.errors.lock().unwrap().len(), 1);
    }
}
