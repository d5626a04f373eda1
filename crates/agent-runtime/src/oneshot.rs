//! Single reasoning call without tools

use crate::executor::{ExecutorEventHandler, NoOpEventHandler};
use agent_core::{Error, Result};
use agent_llm::{Message, ReasoningClient, ReasoningStep, TokenUsage};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A tool-free agent that asks once and returns the text
///
/// Used for summarization and synthesis where no observation loop is needed.
pub struct OneShot {
    client: Arc<dyn ReasoningClient>,
    name: String,
    event_handler: Arc<dyn ExecutorEventHandler>,
}

impl OneShot {
    pub fn new(client: Arc<dyn ReasoningClient>, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
            event_handler: Arc::new(NoOpEventHandler),
        }
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn ExecutorEventHandler>) -> Self {
        self.event_handler = handler;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask a single question
    pub async fn ask(&self, prompt: impl Into<String>) -> Result<(String, TokenUsage)> {
        let conversation = [Message::user(prompt)];
        let started = Instant::now();
        let reasoning = self.client.complete(&conversation, &[]).await?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        debug!(
            agent = %self.name,
            model = %self.client.model(),
            input_tokens = reasoning.usage.input_tokens,
            output_tokens = reasoning.usage.output_tokens,
            "One-shot response received"
        );
        self.event_handler
            .on_reasoning(&self.name, self.client.model(), &reasoning.usage, duration_ms)
            .await;

        match reasoning.step {
            ReasoningStep::FinalAnswer(text) => Ok((text, reasoning.usage)),
            ReasoningStep::ToolBatch(_) => Err(Error::Reasoning(format!(
                "{} requested tools but none are available",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::ScriptedClient;
    use serde_json::json;

    #[tokio::test]
    async fn test_ask_returns_text_and_usage() {
        let client = ScriptedClient::new()
            .then_answer("Short summary")
            .with_usage(TokenUsage::new(10, 3));
        let oneshot = OneShot::new(Arc::new(client), "summarizer");

        let (text, usage) = oneshot.ask("Summarize this report").await.unwrap();
        assert_eq!(text, "Short summary");
        assert_eq!(usage.total(), 13);
    }

    #[tokio::test]
    async fn test_tool_request_is_an_error() {
        let client = ScriptedClient::new().then_tools([("search_news", json!({}))]);
        let oneshot = OneShot::new(Arc::new(client), "synthesis");

        let err = oneshot.ask("Synthesize").await.unwrap_err();
        assert!(matches!(err, Error::Reasoning(_)));
    }
}
