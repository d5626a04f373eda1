//! Anthropic Messages API provider
//!
//! Wrap it in `ProviderReasoningClient` to drive the agent loop.
//! See: https://docs.anthropic.com/en/api/messages

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
}

impl AnthropicProvider {
    /// `timeout` bounds each HTTP round trip, independent of any agent deadline
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, api_key })
    }

    /// Read the key from `ANTHROPIC_API_KEY`
    pub fn from_env(timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            LLMError::ConfigurationError(
                "ANTHROPIC_API_KEY environment variable not set".to_string(),
            )
        })?;
        Self::new(api_key, timeout)
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Anthropic API");

        let anthropic_request = AnthropicRequest {
            model: request.model,
            messages: request.messages,
            system: request.system,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools,
        };

        let response = self
            .client
            .post(format!("{ANTHROPIC_API_BASE}/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(status_error(status.as_u16(), body, anthropic_request.model));
        }

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        debug!(
            "Received response - stop_reason: {}, tokens: {}/{}",
            anthropic_response.stop_reason,
            anthropic_response.usage.input_tokens,
            anthropic_response.usage.output_tokens
        );

        Ok(CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content: Some(MessageContent::Blocks(anthropic_response.content)),
            },
            stop_reason: StopReason::from_wire(&anthropic_response.stop_reason).unwrap_or_else(
                || {
                    debug!("Unknown stop reason: {}", anthropic_response.stop_reason);
                    StopReason::EndTurn
                },
            ),
            usage: TokenUsage::new(
                anthropic_response.usage.input_tokens,
                anthropic_response.usage.output_tokens,
            ),
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

/// Map a non-success HTTP status onto the error the runtime reports
fn status_error(status: u16, body: String, model: String) -> LLMError {
    match status {
        401 | 403 => LLMError::AuthenticationFailed,
        429 | 529 => LLMError::RateLimitExceeded(body),
        400 => LLMError::InvalidRequest(body),
        404 => LLMError::ModelNotFound(model),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}

// Wire types for the Messages endpoint

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    stop_reason: String,
    usage: UsageResponse,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    input_tokens: usize,
    output_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = AnthropicProvider::new("test-key".to_string(), Duration::from_secs(5));
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().name(), "anthropic");
    }

    #[test]
    fn test_request_wire_format() {
        let invocation = agent_core::ToolInvocation::with_id(
            "toolu_1",
            "get_company_data",
            serde_json::json!({"symbol": "OGDC"}),
        );
        let observation =
            agent_core::ToolObservation::success(&invocation, serde_json::json!({"price": 1.0}));
        let request = AnthropicRequest {
            model: "claude-sonnet-4-5-20250929".into(),
            messages: vec![
                Message::user("Get data for OGDC"),
                Message::tool_requests(&[invocation]),
                Message::observations(&[observation]),
            ],
            system: None,
            max_tokens: 1024,
            temperature: None,
            tools: None,
        };

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["messages"][1]["content"][0]["type"], "tool_use");
        assert_eq!(wire["messages"][2]["content"][0]["type"], "tool_result");
        assert_eq!(wire["messages"][2]["content"][0]["tool_use_id"], "toolu_1");
        assert!(wire.get("system").is_none());
    }

    #[test]
    fn test_status_errors() {
        assert!(matches!(
            status_error(401, String::new(), "m".into()),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            status_error(529, "overloaded".into(), "m".into()),
            LLMError::RateLimitExceeded(body) if body == "overloaded"
        ));
        assert!(matches!(
            status_error(404, String::new(), "claude-x".into()),
            LLMError::ModelNotFound(model) if model == "claude-x"
        ));
        assert!(matches!(
            status_error(500, "boom".into(), "m".into()),
            LLMError::RequestFailed(message) if message == "HTTP 500: boom"
        ));
    }

    #[test]
    fn test_from_env_without_key() {
        // SAFETY: no other test in this crate reads ANTHROPIC_API_KEY
        unsafe {
            std::env::remove_var("ANTHROPIC_API_KEY");
        }
        let result = AnthropicProvider::from_env(Duration::from_secs(5));
        assert!(result.is_err());
    }
}
