//! Configuration for equity analysis runs

use crate::error::{AnalysisError, Result};
use agent_core::Budget;
use agent_llm::ReasoningConfig;
use agent_runtime::ExecutorConfig;
use agent_utils::{EnvSource, SystemEnv};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a reasoning client is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Data,
    Research,
    Analyst,
    Synthesis,
    Summarizer,
}

impl AgentRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Research => "research",
            Self::Analyst => "analyst",
            Self::Synthesis => "synthesis",
            Self::Summarizer => "summarizer",
        }
    }

    /// Judgement-heavy roles run on the smart model by default
    pub fn uses_smart_model(self) -> bool {
        matches!(self, Self::Analyst | Self::Synthesis)
    }
}

/// Per-role model overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOverrides {
    pub data: Option<String>,
    pub research: Option<String>,
    pub analyst: Option<String>,
    pub synthesis: Option<String>,
    pub summarizer: Option<String>,
}

impl ModelOverrides {
    fn get(&self, role: AgentRole) -> Option<&str> {
        match role {
            AgentRole::Data => self.data.as_deref(),
            AgentRole::Research => self.research.as_deref(),
            AgentRole::Analyst => self.analyst.as_deref(),
            AgentRole::Synthesis => self.synthesis.as_deref(),
            AgentRole::Summarizer => self.summarizer.as_deref(),
        }
    }

    fn set(&mut self, role: AgentRole, model: String) {
        let slot = match role {
            AgentRole::Data => &mut self.data,
            AgentRole::Research => &mut self.research,
            AgentRole::Analyst => &mut self.analyst,
            AgentRole::Synthesis => &mut self.synthesis,
            AgentRole::Summarizer => &mut self.summarizer,
        };
        *slot = Some(model);
    }
}

/// Configuration for equity analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Model for analyst and synthesis
    pub smart_model: String,

    /// Model for data, research and the document summarizer
    pub fast_model: String,

    pub models: ModelOverrides,

    pub temperature: f32,

    /// Max output tokens per completion
    pub max_tokens: usize,

    /// HTTP timeout for one completion request
    pub llm_timeout: Duration,

    /// Wall-clock limit for one specialist run
    pub agent_timeout: Option<Duration>,

    pub data_budget: Budget,
    pub research_budget: Budget,
    pub analyst_budget: Budget,

    /// Run the symbols of a comparison concurrently
    pub parallel_symbols: bool,

    /// Peers returned by `get_sector_peers` when the call does not say
    pub max_peers: usize,

    /// Longer documents are summarized before they reach the research agent
    pub summary_max_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            smart_model: "claude-sonnet-4-5-20250929".to_string(),
            fast_model: "claude-3-5-haiku-latest".to_string(),
            models: ModelOverrides::default(),
            temperature: 0.0,
            max_tokens: 4096,
            llm_timeout: Duration::from_secs(120),
            agent_timeout: Some(Duration::from_secs(300)),
            data_budget: Budget::new(5, 60_000),
            research_budget: Budget::new(7, 120_000),
            analyst_budget: Budget::new(8, 120_000),
            parallel_symbols: true,
            max_peers: 5,
            summary_max_chars: 50_000,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Defaults overridden by `EQUITY_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_source(&SystemEnv)
    }

    /// Defaults overridden by `EQUITY_*` variables read from `env`
    pub fn from_source(env: &impl EnvSource) -> Result<Self> {
        let mut config = Self::default();

        if let Some(model) = env.string("EQUITY_LLM_MODEL") {
            config.smart_model = model;
        }
        if let Some(model) = env.string("EQUITY_LLM_FAST_MODEL") {
            config.fast_model = model;
        }
        if let Some(temperature) = env.parse("EQUITY_LLM_TEMPERATURE")? {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = env.parse("EQUITY_LLM_MAX_TOKENS")? {
            config.max_tokens = max_tokens;
        }
        if let Some(timeout) = env.seconds("EQUITY_LLM_TIMEOUT")? {
            config.llm_timeout = timeout;
        }
        for (key, role) in [
            ("EQUITY_MODEL_DATA", AgentRole::Data),
            ("EQUITY_MODEL_RESEARCH", AgentRole::Research),
            ("EQUITY_MODEL_ANALYST", AgentRole::Analyst),
            ("EQUITY_MODEL_SYNTHESIS", AgentRole::Synthesis),
            ("EQUITY_MODEL_SUMMARIZER", AgentRole::Summarizer),
        ] {
            if let Some(model) = env.string(key) {
                config.models.set(role, model);
            }
        }
        // 0 disables the per-run deadline
        if let Some(timeout) = env.seconds("EQUITY_AGENT_TIMEOUT")? {
            config.agent_timeout = (!timeout.is_zero()).then_some(timeout);
        }
        if let Some(parallel) = env.flag("EQUITY_PARALLEL_SYMBOLS")? {
            config.parallel_symbols = parallel;
        }
        if let Some(max_peers) = env.parse("EQUITY_MAX_PEERS")? {
            config.max_peers = max_peers;
        }
        if let Some(max_chars) = env.parse("EQUITY_SUMMARY_MAX_CHARS")? {
            config.summary_max_chars = max_chars;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.smart_model.trim().is_empty() || self.fast_model.trim().is_empty() {
            return Err(AnalysisError::Config("model names must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(AnalysisError::Config(format!(
                "temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AnalysisError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        for (name, budget) in [
            ("data", self.data_budget),
            ("research", self.research_budget),
            ("analyst", self.analyst_budget),
        ] {
            if budget.max_iterations == 0 || budget.max_tokens == 0 {
                return Err(AnalysisError::Config(format!(
                    "{name} budget must allow at least one iteration and one token"
                )));
            }
        }
        if self.max_peers == 0 {
            return Err(AnalysisError::Config(
                "max_peers must be greater than 0".to_string(),
            ));
        }
        if self.summary_max_chars == 0 {
            return Err(AnalysisError::Config(
                "summary_max_chars must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Model used for `role`
    pub fn model(&self, role: AgentRole) -> &str {
        self.models.get(role).unwrap_or(if role.uses_smart_model() {
            &self.smart_model
        } else {
            &self.fast_model
        })
    }

    pub fn reasoning_config(&self, role: AgentRole, system_prompt: Option<&str>) -> ReasoningConfig {
        ReasoningConfig {
            model: self.model(role).to_string(),
            system_prompt: system_prompt.map(str::to_string),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        }
    }

    /// Executor settings for a tool-using specialist
    pub fn executor_config(&self, role: AgentRole) -> ExecutorConfig {
        let budget = match role {
            AgentRole::Data => self.data_budget,
            AgentRole::Research => self.research_budget,
            _ => self.analyst_budget,
        };
        ExecutorConfig {
            name: role.as_str().to_string(),
            budget,
            deadline: self.agent_timeout,
        }
    }
}

/// Builder for AnalysisConfig
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    config: Option<AnalysisConfig>,
}

impl AnalysisConfigBuilder {
    fn config(&mut self) -> &mut AnalysisConfig {
        self.config.get_or_insert_with(AnalysisConfig::default)
    }

    pub fn smart_model(mut self, model: impl Into<String>) -> Self {
        self.config().smart_model = model.into();
        self
    }

    pub fn fast_model(mut self, model: impl Into<String>) -> Self {
        self.config().fast_model = model.into();
        self
    }

    /// Pin one role to a specific model
    pub fn model(mut self, role: AgentRole, model: impl Into<String>) -> Self {
        self.config().models.set(role, model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config().temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config().max_tokens = max_tokens;
        self
    }

    pub fn llm_timeout(mut self, timeout: Duration) -> Self {
        self.config().llm_timeout = timeout;
        self
    }

    /// `None` lets specialist runs go until their budgets stop them
    pub fn agent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config().agent_timeout = timeout;
        self
    }

    pub fn data_budget(mut self, budget: Budget) -> Self {
        self.config().data_budget = budget;
        self
    }

    pub fn research_budget(mut self, budget: Budget) -> Self {
        self.config().research_budget = budget;
        self
    }

    pub fn analyst_budget(mut self, budget: Budget) -> Self {
        self.config().analyst_budget = budget;
        self
    }

    pub fn parallel_symbols(mut self, parallel: bool) -> Self {
        self.config().parallel_symbols = parallel;
        self
    }

    pub fn max_peers(mut self, max_peers: usize) -> Self {
        self.config().max_peers = max_peers;
        self
    }

    pub fn summary_max_chars(mut self, max_chars: usize) -> Self {
        self.config().summary_max_chars = max_chars;
        self
    }

    /// Build the configuration
    pub fn build(mut self) -> Result<AnalysisConfig> {
        let config = self.config.take().unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}
