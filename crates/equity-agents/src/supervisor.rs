//! Supervisor: routes a request through the specialists and builds the report
//!
//! For every requested symbol the supervisor runs the data specialist, then
//! research with the data digest, then the analyst with both digests. A
//! failing stage leaves a gap in the symbol's slot instead of failing the
//! request. Comparisons run their symbols concurrently when
//! `parallel_symbols` is set; each pipeline owns its slot until the join.

use crate::agents::{self, AnalystExtractor, DataExtractor, ResearchExtractor};
use crate::collaborators::{DataSource, DocumentSource, NewsSearch};
use crate::config::{AgentRole, AnalysisConfig};
use crate::digest::{analyst_context, research_context};
use crate::error::{AnalysisError, Result};
use crate::metrics::MetricsCollector;
use crate::output::DataOutput;
use crate::ranking::rank;
use crate::report::{AnalysisReport, ComparisonReport, Report, ReportOverview};
use crate::router::{Classification, QueryRouter, RequestKind};
use crate::state::{AnalysisState, SymbolSlot};
use crate::synthesis::{Synthesizer, overall_recommendation};
use crate::tools::Catalog;
use agent_core::Error;
use agent_llm::{LLMProvider, ProviderReasoningClient, ReasoningClient};
use agent_runtime::{AgentRuntime, Extractor, OneShot, SpecialistAgent};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Gap recorded for a symbol that produced neither a quote nor a profile
pub const NO_CORE_DATA: &str = "no quote or company data";

/// One reasoning client per role
#[derive(Clone)]
pub struct AgentClients {
    pub data: Arc<dyn ReasoningClient>,
    pub research: Arc<dyn ReasoningClient>,
    pub analyst: Arc<dyn ReasoningClient>,
    /// `None` always uses the assembled summary
    pub synthesis: Option<Arc<dyn ReasoningClient>>,
    pub summarizer: Arc<dyn ReasoningClient>,
}

impl AgentClients {
    /// The same client everywhere
    pub fn uniform(client: Arc<dyn ReasoningClient>) -> Self {
        Self {
            data: Arc::clone(&client),
            research: Arc::clone(&client),
            analyst: Arc::clone(&client),
            synthesis: Some(Arc::clone(&client)),
            summarizer: client,
        }
    }

    /// Clients for one provider, each with its role's model and system prompt
    pub fn from_provider(provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Self {
        let client = |role: AgentRole, prompt: Option<&str>| -> Arc<dyn ReasoningClient> {
            Arc::new(ProviderReasoningClient::new(
                Arc::clone(&provider),
                config.reasoning_config(role, prompt),
            ))
        };
        Self {
            data: client(AgentRole::Data, Some(agents::data::SYSTEM_PROMPT)),
            research: client(AgentRole::Research, Some(agents::research::SYSTEM_PROMPT)),
            analyst: client(AgentRole::Analyst, Some(agents::analyst::SYSTEM_PROMPT)),
            synthesis: Some(client(AgentRole::Synthesis, None)),
            summarizer: client(AgentRole::Summarizer, None),
        }
    }

    /// Anthropic clients using `ANTHROPIC_API_KEY`
    pub fn anthropic(config: &AnalysisConfig) -> Result<Self> {
        let provider = agent_llm::providers::AnthropicProvider::from_env(config.llm_timeout)
            .map_err(Error::from)?;
        Ok(Self::from_provider(Arc::new(provider), config))
    }

    /// Skip the synthesis call
    pub fn without_synthesis(mut self) -> Self {
        self.synthesis = None;
        self
    }
}

/// Coordinates the specialists for one request at a time
pub struct Supervisor {
    config: AnalysisConfig,
    router: QueryRouter,
    data: SpecialistAgent<DataExtractor>,
    research: SpecialistAgent<ResearchExtractor>,
    analyst: SpecialistAgent<AnalystExtractor>,
    synthesizer: Synthesizer,
    metrics: Arc<MetricsCollector>,
}

impl Supervisor {
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Calls recorded since the latest request started
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Answer a natural-language request
    ///
    /// # Errors
    ///
    /// `NoSymbolsResolved` when the query names no symbol or none of them
    /// yields data. Stage failures never fail the request.
    pub async fn analyze(&self, query: &str) -> Result<Report> {
        let classification = self.router.classify(query)?;
        self.run(query, classification).await
    }

    /// Analyse an explicit list; more than one symbol is a comparison
    pub async fn analyze_symbols<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Report> {
        let classification = self.router.classify_symbols(symbols)?;
        let query = format!("Analyze {}", classification.symbols.join(", "));
        self.run(&query, classification).await
    }

    /// Rank an explicit list against each other, whatever its length
    pub async fn compare<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Report> {
        let mut classification = self.router.classify_symbols(symbols)?;
        classification.kind = RequestKind::Comparison;
        let query = format!("Compare {}", classification.symbols.join(", "));
        self.run(&query, classification).await
    }

    async fn run(&self, query: &str, classification: Classification) -> Result<Report> {
        let started = Instant::now();
        let mark = self.metrics.start_run();
        let result = self.execute(query, classification).await;
        let metrics = self.metrics.finish_run(mark);

        if let Ok(report) = &result {
            info!(
                report_id = %report.overview().id,
                recommendation = %report.recommendation(),
                symbols = ?report.symbols(),
                gaps = report.overview().data_gaps.len(),
                reasoning_calls = metrics.reasoning_calls,
                tool_calls = metrics.tool_calls,
                total_tokens = metrics.total_tokens,
                estimated_cost_usd = metrics.estimated_cost_usd,
                duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Analysis complete"
            );
        }
        result
    }

    async fn execute(&self, query: &str, classification: Classification) -> Result<Report> {
        let Classification { symbols, kind } = classification;
        info!(query = %query, symbols = ?symbols, kind = ?kind, "Analysis started");

        let mut state = AnalysisState::new(query, kind, symbols.clone());
        let parallel =
            kind == RequestKind::Comparison && self.config.parallel_symbols && symbols.len() > 1;
        let slots = if parallel {
            join_all(symbols.iter().map(|symbol| async move {
                (symbol.clone(), self.process_symbol(symbol).await)
            }))
            .await
        } else {
            let mut slots = Vec::with_capacity(symbols.len());
            for symbol in &symbols {
                slots.push((symbol.clone(), self.process_symbol(symbol).await));
            }
            slots
        };

        for (symbol, slot) in slots {
            if !slot.has_data() {
                state.errors.push(format!("{symbol}: {NO_CORE_DATA}"));
            }
            state.slots.insert(symbol, slot);
        }

        let resolved = state.resolved_symbols();
        if resolved.is_empty() {
            error!(query = %query, errors = ?state.errors, "No symbol produced data");
            return Err(AnalysisError::Agent(Error::NoSymbolsResolved(format!(
                "no data for {}",
                symbols.join(", ")
            ))));
        }

        let synthesis = self.synthesizer.synthesize(&state).await;
        let (recommendation, confidence) = overall_recommendation(&state);
        let overview = ReportOverview {
            id: Uuid::new_v4(),
            query: query.to_string(),
            symbols: resolved,
            summary: synthesis.summary,
            recommendation,
            confidence,
            key_findings: synthesis.key_findings,
            risks: synthesis.risks,
            data_gaps: state.all_gaps(),
            synthesized: synthesis.generated,
            generated_at: Utc::now(),
        };

        let report = match kind {
            RequestKind::Analysis => Report::Analysis(AnalysisReport { overview, state }),
            RequestKind::Comparison => {
                let rankings = rank(state.analyses());
                let winner = rankings.first().map(|r| r.symbol.clone());
                Report::Comparison(ComparisonReport {
                    overview,
                    rankings,
                    winner,
                    state,
                })
            }
        };

        Ok(report)
    }

    /// Data, then research, then analysis for one symbol
    async fn process_symbol(&self, symbol: &str) -> SymbolSlot {
        let mut slot = SymbolSlot::default();

        let outcome = self.data.run(agents::data::task(symbol)).await;
        let data = match outcome.result {
            Ok(data) => data,
            Err(e) => {
                error!(
                    symbol = %symbol,
                    error = %e,
                    partial = e.is_partial(),
                    observations = outcome.observations.len(),
                    "Data stage failed"
                );
                slot.add_gap(format!("data: {e}"));
                self.data
                    .extractor()
                    .project(symbol, &outcome.observations)
                    .unwrap_or_else(|_| DataOutput::new(symbol))
            }
        };
        slot.data_gaps.extend(data.data_gaps.iter().cloned());

        if !data.has_core_data() {
            warn!(symbol = %symbol, "No quote or company data, skipping research and analysis");
            slot.add_gap(NO_CORE_DATA);
            slot.data = Some(data);
            return slot;
        }

        let outcome = self
            .research
            .run(agents::research::task(symbol, &research_context(&data)))
            .await;
        let research = match outcome.result {
            Ok(research) => Some(research),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Research stage failed");
                slot.add_gap(format!("research: {e}"));
                None
            }
        };

        let context = analyst_context(&data, research.as_ref());
        let outcome = self.analyst.run(agents::analyst::task(symbol, &context)).await;
        match outcome.result {
            Ok(analysis) => {
                info!(
                    symbol = %symbol,
                    recommendation = %analysis.recommendation,
                    confidence = analysis.confidence,
                    iterations = outcome.iterations,
                    "Analysis stage complete"
                );
                slot.analysis = Some(analysis);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Analysis stage failed");
                slot.add_gap(format!("analysis: {e}"));
            }
        }

        slot.data = Some(data);
        slot.research = research;
        slot
    }
}

/// Builder for [`Supervisor`]
#[derive(Default)]
pub struct SupervisorBuilder {
    config: Option<AnalysisConfig>,
    clients: Option<AgentClients>,
    data_source: Option<Arc<dyn DataSource>>,
    news: Option<Arc<dyn NewsSearch>>,
    documents: Option<Arc<dyn DocumentSource>>,
}

impl SupervisorBuilder {
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn clients(mut self, clients: AgentClients) -> Self {
        self.clients = Some(clients);
        self
    }

    pub fn data_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.data_source = Some(source);
        self
    }

    pub fn news(mut self, news: Arc<dyn NewsSearch>) -> Self {
        self.news = Some(news);
        self
    }

    pub fn documents(mut self, documents: Arc<dyn DocumentSource>) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Wire the tool catalog, runtime and specialists
    ///
    /// # Errors
    ///
    /// `Config` when a collaborator or the clients are missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<Supervisor> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let missing = |what: &str| AnalysisError::Config(format!("{what} is required"));
        let clients = self.clients.ok_or_else(|| missing("reasoning clients"))?;
        let data_source = self.data_source.ok_or_else(|| missing("data source"))?;
        let news = self.news.ok_or_else(|| missing("news search"))?;
        let documents = self.documents.ok_or_else(|| missing("document source"))?;

        let metrics = Arc::new(MetricsCollector::new());
        let summarizer = Arc::new(
            OneShot::new(clients.summarizer, AgentRole::Summarizer.as_str())
                .with_event_handler(metrics.clone()),
        );
        let catalog = Catalog {
            data_source,
            news,
            documents,
            summarizer: Some(summarizer),
            max_peers: config.max_peers,
            summary_max_chars: config.summary_max_chars,
        };

        let runtime = AgentRuntime::builder()
            .tool_registry(catalog.registry()?)
            .event_handler(metrics.clone())
            .build();

        let data = runtime.create_specialist(
            clients.data,
            config.executor_config(AgentRole::Data),
            agents::data::TOOLS,
            DataExtractor,
        )?;
        let research = runtime.create_specialist(
            clients.research,
            config.executor_config(AgentRole::Research),
            agents::research::TOOLS,
            ResearchExtractor,
        )?;
        let analyst = runtime.create_specialist(
            clients.analyst,
            config.executor_config(AgentRole::Analyst),
            agents::analyst::TOOLS,
            AnalystExtractor,
        )?;

        let synthesizer = match clients.synthesis {
            Some(client) => Synthesizer::new(Arc::new(
                runtime.create_oneshot(client, AgentRole::Synthesis.as_str()),
            )),
            None => Synthesizer::deterministic(),
        };

        info!(
            smart_model = %config.smart_model,
            fast_model = %config.fast_model,
            tools = runtime.tools().len(),
            parallel_symbols = config.parallel_symbols,
            "Supervisor ready"
        );

        Ok(Supervisor {
            config,
            router: QueryRouter::new()?,
            data,
            research,
            analyst,
            synthesizer,
            metrics,
        })
    }
}
