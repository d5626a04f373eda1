//! Scripted reasoning client with canned turns
//!
//! `ScriptedClient` replays a fixed sequence of reasoning turns, so the agent
//! loop and everything built on it can be exercised without a live backend.
//! Scripts can be keyed by subject: a keyed script is used when the first user
//! message of the conversation contains the key as a whole word (a ticker
//! symbol, for example), which keeps concurrent runs for different subjects
//! independent. When several keys appear, the one mentioned first wins.

use crate::{
    LLMError, Message, Reasoning, ReasoningClient, ReasoningStep, Result, TokenUsage,
    ToolDefinition, reasoning::estimate_tokens,
};
use agent_core::ToolInvocation;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// One canned turn
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedTurn {
    /// Request a batch of tools
    Tools(Vec<ToolInvocation>),
    /// Return a final answer
    Answer(String),
    /// Fail with a provider error
    Fail(String),
}

impl ScriptedTurn {
    /// Batch built from `(tool name, arguments)` pairs
    pub fn tools<I, S>(calls: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Self::Tools(
            calls
                .into_iter()
                .map(|(name, arguments)| ToolInvocation::new(name, arguments))
                .collect(),
        )
    }

    pub fn answer(text: impl Into<String>) -> Self {
        Self::Answer(text.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

#[derive(Debug, Default)]
struct Script {
    default: VecDeque<ScriptedTurn>,
    keyed: HashMap<String, VecDeque<ScriptedTurn>>,
    transcripts: Vec<Vec<Message>>,
}

/// Reasoning client that replays canned turns
#[derive(Debug)]
pub struct ScriptedClient {
    model: String,
    script: Mutex<Script>,
    fallback: Option<ScriptedTurn>,
    delay: Option<Duration>,
    fixed_usage: Option<TokenUsage>,
    calls: AtomicUsize,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            model: "scripted".to_string(),
            script: Mutex::new(Script::default()),
            fallback: None,
            delay: None,
            fixed_usage: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Append a turn to the default script
    pub fn then(mut self, turn: ScriptedTurn) -> Self {
        self.script.get_mut().default.push_back(turn);
        self
    }

    /// Append a tool batch to the default script
    pub fn then_tools<I, S>(self, calls: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        self.then(ScriptedTurn::tools(calls))
    }

    /// Append a final answer to the default script
    pub fn then_answer(self, text: impl Into<String>) -> Self {
        self.then(ScriptedTurn::answer(text))
    }

    /// Script used when the conversation is about `subject`
    pub fn for_subject(
        mut self,
        subject: impl Into<String>,
        turns: impl IntoIterator<Item = ScriptedTurn>,
    ) -> Self {
        self.script
            .get_mut()
            .keyed
            .entry(subject.into())
            .or_default()
            .extend(turns);
        self
    }

    /// Turn returned once a script is exhausted
    pub fn otherwise(mut self, turn: ScriptedTurn) -> Self {
        self.fallback = Some(turn);
        self
    }

    /// Sleep before answering each turn
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report a fixed usage per turn instead of the character estimate
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.fixed_usage = Some(usage);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Number of `complete` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every conversation received, in call order
    pub async fn transcripts(&self) -> Vec<Vec<Message>> {
        self.script.lock().await.transcripts.clone()
    }

    fn subject_key(script: &Script, conversation: &[Message]) -> Option<String> {
        let first = conversation.iter().find_map(Message::text)?;
        first
            .split(|c: char| !c.is_ascii_alphanumeric())
            .find(|word| !word.is_empty() && script.keyed.contains_key(*word))
            .map(str::to_string)
    }

    fn usage_for(&self, conversation: &[Message], turn: &ScriptedTurn) -> TokenUsage {
        if let Some(usage) = self.fixed_usage {
            return usage;
        }
        let input_chars: usize = conversation.iter().map(Message::char_len).sum();
        let output_chars = match turn {
            ScriptedTurn::Tools(batch) => batch
                .iter()
                .map(|i| i.name.len() + i.arguments.to_string().len())
                .sum(),
            ScriptedTurn::Answer(text) => text.chars().count(),
            ScriptedTurn::Fail(_) => 0,
        };
        TokenUsage::new(estimate_tokens(input_chars), estimate_tokens(output_chars))
    }
}

#[async_trait]
impl ReasoningClient for ScriptedClient {
    async fn complete(
        &self,
        conversation: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<Reasoning> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let turn = {
            let mut script = self.script.lock().await;
            script.transcripts.push(conversation.to_vec());
            let next = match Self::subject_key(&script, conversation) {
                Some(key) => script.keyed.get_mut(&key).and_then(VecDeque::pop_front),
                None => script.default.pop_front(),
            };
            next.or_else(|| self.fallback.clone())
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let Some(turn) = turn else {
            return Err(LLMError::UnexpectedResponse("script exhausted".to_string()));
        };
        let usage = self.usage_for(conversation, &turn);

        match turn {
            ScriptedTurn::Tools(batch) if batch.is_empty() => Err(LLMError::EmptyToolBatch),
            ScriptedTurn::Tools(batch) => Ok(Reasoning {
                step: ReasoningStep::ToolBatch(batch),
                usage,
            }),
            ScriptedTurn::Answer(text) => Ok(Reasoning {
                step: ReasoningStep::FinalAnswer(text),
                usage,
            }),
            ScriptedTurn::Fail(message) => Err(LLMError::ProviderError(message)),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
