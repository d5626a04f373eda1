//! Reasoning and tool call metrics with cost estimation

use agent_llm::TokenUsage;
use agent_runtime::ExecutorEventHandler;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// USD per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPrice {
    pub input: f64,
    pub output: f64,
}

impl ModelPrice {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.input_tokens as f64 / 1_000_000.0) * self.input
            + (usage.output_tokens as f64 / 1_000_000.0) * self.output
    }
}

/// Price used for models missing from the table
pub const DEFAULT_PRICE: ModelPrice = ModelPrice::new(5.0, 15.0);

const PRICES: &[(&str, ModelPrice)] = &[
    ("claude-sonnet-4-5-20250929", ModelPrice::new(3.0, 15.0)),
    ("claude-sonnet-4-5", ModelPrice::new(3.0, 15.0)),
    ("claude-3-5-sonnet-latest", ModelPrice::new(3.0, 15.0)),
    ("claude-3-5-haiku-latest", ModelPrice::new(0.8, 4.0)),
    ("claude-3-5-haiku-20241022", ModelPrice::new(0.8, 4.0)),
    ("claude-3-opus-latest", ModelPrice::new(15.0, 75.0)),
    ("claude-3-haiku-20240307", ModelPrice::new(0.25, 1.25)),
    ("gpt-4o", ModelPrice::new(2.5, 10.0)),
    ("gpt-4o-mini", ModelPrice::new(0.15, 0.6)),
];

/// Look up the price for a model
pub fn price_for(model: &str) -> ModelPrice {
    PRICES
        .iter()
        .find(|(name, _)| *name == model)
        .map_or(DEFAULT_PRICE, |(_, price)| *price)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasoningCall {
    pub agent: String,
    pub model: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub agent: String,
    pub tool: String,
    pub duration_ms: u64,
    pub success: bool,
}

/// Per-agent totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentUsage {
    pub reasoning_calls: usize,
    pub tool_calls: usize,
    pub failed_tool_calls: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub cost_usd: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub reasoning_calls: usize,
    pub tool_calls: usize,
    pub failed_tool_calls: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
    pub reasoning_ms: u64,
    pub estimated_cost_usd: f64,
    pub by_agent: HashMap<String, AgentUsage>,
}

#[derive(Debug, Default)]
struct Records {
    reasoning: Vec<ReasoningCall>,
    tools: Vec<ToolCall>,
    active_runs: usize,
}

/// Where a run's records begin, returned by [`MetricsCollector::start_run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMark {
    reasoning: usize,
    tools: usize,
}

/// Collects every reasoning and tool call made by the agents it is wired to
///
/// Records are kept from the start of the most recent run. A run that starts
/// while no other run is active clears them; overlapping runs share the
/// records and each summary covers everything since its own mark.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    records: Mutex<Records>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reasoning_calls(&self) -> Vec<ReasoningCall> {
        self.lock().reasoning.clone()
    }

    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.lock().tools.clone()
    }

    /// Forget everything recorded so far
    pub fn reset(&self) {
        let mut records = self.lock();
        records.reasoning.clear();
        records.tools.clear();
    }

    /// Begin accounting for one request
    pub fn start_run(&self) -> RunMark {
        let mut records = self.lock();
        if records.active_runs == 0 {
            records.reasoning.clear();
            records.tools.clear();
        }
        records.active_runs += 1;
        RunMark {
            reasoning: records.reasoning.len(),
            tools: records.tools.len(),
        }
    }

    /// Close a run and summarize the calls recorded since `mark`
    pub fn finish_run(&self, mark: RunMark) -> MetricsSummary {
        let mut records = self.lock();
        records.active_runs = records.active_runs.saturating_sub(1);
        let reasoning = records.reasoning.get(mark.reasoning..).unwrap_or_default();
        let tools = records.tools.get(mark.tools..).unwrap_or_default();
        summarize(reasoning, tools)
    }

    pub fn summary(&self) -> MetricsSummary {
        let records = self.lock();
        summarize(&records.reasoning, &records.tools)
    }
}

fn summarize(reasoning: &[ReasoningCall], tools: &[ToolCall]) -> MetricsSummary {
    let mut summary = MetricsSummary::default();

    for call in reasoning {
        let usage = TokenUsage::new(call.input_tokens, call.output_tokens);
        let cost = price_for(&call.model).cost(&usage);

        summary.reasoning_calls += 1;
        summary.input_tokens += call.input_tokens;
        summary.output_tokens += call.output_tokens;
        summary.reasoning_ms += call.duration_ms;
        summary.estimated_cost_usd += cost;

        let agent = summary.by_agent.entry(call.agent.clone()).or_default();
        agent.reasoning_calls += 1;
        agent.input_tokens += call.input_tokens;
        agent.output_tokens += call.output_tokens;
        agent.cost_usd += cost;
    }

    for call in tools {
        summary.tool_calls += 1;
        let agent = summary.by_agent.entry(call.agent.clone()).or_default();
        agent.tool_calls += 1;
        if !call.success {
            summary.failed_tool_calls += 1;
            agent.failed_tool_calls += 1;
        }
    }

    summary.total_tokens = summary.input_tokens + summary.output_tokens;
    summary
}

#[async_trait]
impl ExecutorEventHandler for MetricsCollector {
    async fn on_reasoning(&self, agent: &str, model: &str, usage: &TokenUsage, duration_ms: u64) {
        self.lock().reasoning.push(ReasoningCall {
            agent: agent.to_string(),
            model: model.to_string(),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            duration_ms,
        });
    }

    async fn on_tool_done(
        &self,
        agent: &str,
        _id: &str,
        name: &str,
        result: Result<&Value, &str>,
        duration_ms: u64,
    ) {
        if let Err(message) = result {
            debug!(agent = %agent, tool_name = %name, error = %message, "Tool call failed");
        }
        self.lock().tools.push(ToolCall {
            agent: agent.to_string(),
            tool: name.to_string(),
            duration_ms,
            success: result.is_ok(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_lookup() {
        assert_eq!(price_for("claude-3-5-haiku-latest"), ModelPrice::new(0.8, 4.0));
        assert_eq!(price_for("some-local-model"), DEFAULT_PRICE);
    }

    #[test]
    fn test_cost_per_million() {
        let cost = DEFAULT_PRICE.cost(&TokenUsage::new(1_000_000, 100_000));
        assert!((cost - 6.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_summary_aggregates_by_agent() {
        let metrics = MetricsCollector::new();
        metrics
            .on_reasoning("data", "claude-3-5-haiku-latest", &TokenUsage::new(1000, 200), 40)
            .await;
        metrics
            .on_reasoning("analyst", "unknown", &TokenUsage::new(2000, 500), 60)
            .await;
        metrics
            .on_tool_done("data", "call_1", "get_company_data", Ok(&json!({})), 5)
            .await;
        metrics
            .on_tool_done("data", "call_2", "get_sector_peers", Err("timeout"), 7)
            .await;

        let summary = metrics.summary();
        assert_eq!(summary.reasoning_calls, 2);
        assert_eq!(summary.total_tokens, 3700);
        assert_eq!(summary.reasoning_ms, 100);
        assert_eq!(summary.tool_calls, 2);
        assert_eq!(summary.failed_tool_calls, 1);

        let expected = 1000.0 / 1e6 * 0.8 + 200.0 / 1e6 * 4.0 + 2000.0 / 1e6 * 5.0 + 500.0 / 1e6 * 15.0;
        assert!((summary.estimated_cost_usd - expected).abs() < 1e-12);

        let data = &summary.by_agent["data"];
        assert_eq!(data.tool_calls, 2);
        assert_eq!(data.failed_tool_calls, 1);
        assert_eq!(data.input_tokens, 1000);

        metrics.reset();
        assert_eq!(metrics.summary(), MetricsSummary::default());
    }

    #[tokio::test]
    async fn test_runs_are_summarized_separately() {
        let metrics = MetricsCollector::new();
        let usage = TokenUsage::new(100, 10);

        let first = metrics.start_run();
        metrics.on_reasoning("data", "m", &usage, 1).await;
        metrics.on_reasoning("data", "m", &usage, 1).await;
        assert_eq!(metrics.finish_run(first).reasoning_calls, 2);

        let second = metrics.start_run();
        metrics.on_reasoning("analyst", "m", &usage, 1).await;
        let summary = metrics.finish_run(second);
        assert_eq!(summary.reasoning_calls, 1);
        assert_eq!(summary.total_tokens, 110);
        assert_eq!(metrics.summary().reasoning_calls, 1);
    }

    #[tokio::test]
    async fn test_overlapping_runs_keep_records() {
        let metrics = MetricsCollector::new();
        let usage = TokenUsage::new(1, 1);

        let outer = metrics.start_run();
        metrics.on_reasoning("data", "m", &usage, 1).await;
        let inner = metrics.start_run();
        metrics.on_reasoning("research", "m", &usage, 1).await;

        assert_eq!(metrics.finish_run(inner).reasoning_calls, 1);
        assert_eq!(metrics.finish_run(outer).reasoning_calls, 2);
    }
}
