//! LLM provider trait and its reasoning-client adapter

use crate::{
    CompletionRequest, CompletionResponse, LLMError, Message, Reasoning, ReasoningClient,
    ReasoningStep, Result, StopReason, ToolDefinition,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Trait for LLM providers
///
/// Implementations of this trait provide access to a concrete LLM service
/// (e.g., Anthropic).
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages, tools, and parameters
    ///
    /// # Returns
    ///
    /// The completion response with the assistant's message and metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "anthropic")
    fn name(&self) -> &str;
}

/// Per-client request settings
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: Some(0.0),
        }
    }
}

/// Adapts an `LLMProvider` to the `ReasoningClient` contract
pub struct ProviderReasoningClient {
    provider: Arc<dyn LLMProvider>,
    config: ReasoningConfig,
}

impl ProviderReasoningClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ReasoningConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    fn build_request(&self, conversation: &[Message], tools: &[ToolDefinition]) -> CompletionRequest {
        CompletionRequest::new(&self.config.model, conversation.to_vec(), self.config.max_tokens)
            .with_system(self.config.system_prompt.as_deref())
            .with_temperature(self.config.temperature)
            .with_tools(tools)
    }
}

/// Interpret a raw completion as a reasoning step
pub fn interpret_response(response: CompletionResponse) -> Result<Reasoning> {
    let batch = response.message.tool_invocations();
    if !batch.is_empty() {
        return Ok(Reasoning {
            step: ReasoningStep::ToolBatch(batch),
            usage: response.usage,
        });
    }

    if response.stop_reason == StopReason::ToolUse {
        return Err(LLMError::EmptyToolBatch);
    }

    match response.message.text() {
        Some(text) => Ok(Reasoning {
            step: ReasoningStep::FinalAnswer(text.to_string()),
            usage: response.usage,
        }),
        None => Err(LLMError::UnexpectedResponse(format!(
            "no text or tool use in response (stop_reason: {:?})",
            response.stop_reason
        ))),
    }
}

#[async_trait]
impl ReasoningClient for ProviderReasoningClient {
    #[instrument(skip_all, fields(provider = %self.provider.name(), model = %self.config.model))]
    async fn complete(
        &self,
        conversation: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Reasoning> {
        let request = self.build_request(conversation, tools);
        debug!(
            messages = request.messages.len(),
            tool_count = tools.len(),
            "Sending reasoning request"
        );

        let response = self.provider.complete(request).await?;
        debug!(
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Reasoning response received"
        );

        interpret_response(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContentBlock, MessageContent, Role, TokenUsage};
    use serde_json::json;

    struct CannedProvider {
        response: CompletionResponse,
    }

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
            assert_eq!(request.model, "test-model");
            Ok(self.response.clone())
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn response(blocks: Vec<ContentBlock>, stop_reason: StopReason) -> CompletionResponse {
        CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content: Some(MessageContent::Blocks(blocks)),
            },
            stop_reason,
            usage: TokenUsage::new(120, 30),
        }
    }

    fn client(response: CompletionResponse) -> ProviderReasoningClient {
        ProviderReasoningClient::new(
            Arc::new(CannedProvider { response }),
            ReasoningConfig {
                model: "test-model".into(),
                ..ReasoningConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_tool_use_becomes_batch() {
        let client = client(response(
            vec![
                ContentBlock::Text {
                    text: "Fetching".into(),
                },
                ContentBlock::ToolUse {
                    id: "t1".into(),
                    name: "get_company_data".into(),
                    input: json!({"symbol": "OGDC"}),
                },
            ],
            StopReason::ToolUse,
        ));

        let reasoning = client.complete(&[Message::user("go")], &[]).await.unwrap();
        let ReasoningStep::ToolBatch(batch) = reasoning.step else {
            panic!("expected a batch");
        };
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].name, "get_company_data");
        assert_eq!(reasoning.usage.total(), 150);
    }

    #[tokio::test]
    async fn test_end_turn_becomes_final_answer() {
        let client = client(response(
            vec![ContentBlock::Text {
                text: "{\"recommendation\": \"BUY\"}".into(),
            }],
            StopReason::EndTurn,
        ));

        let reasoning = client.complete(&[Message::user("go")], &[]).await.unwrap();
        assert_eq!(
            reasoning.step,
            ReasoningStep::FinalAnswer("{\"recommendation\": \"BUY\"}".into())
        );
    }

    #[tokio::test]
    async fn test_empty_tool_use_is_an_error() {
        let client = client(response(vec![], StopReason::ToolUse));
        let err = client.complete(&[Message::user("go")], &[]).await.unwrap_err();
        assert!(matches!(err, LLMError::EmptyToolBatch));
    }

    #[tokio::test]
    async fn test_empty_end_turn_is_an_error() {
        let client = client(response(vec![], StopReason::EndTurn));
        let err = client.complete(&[Message::user("go")], &[]).await.unwrap_err();
        assert!(matches!(err, LLMError::UnexpectedResponse(_)));
    }
}
