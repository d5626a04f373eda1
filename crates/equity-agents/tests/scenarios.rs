//! End-to-end requests through the supervisor with scripted reasoning

use agent_core::Error;
use agent_llm::{ReasoningClient, ScriptedClient, ScriptedTurn};
use anyhow::Result;
use equity_agents::models::{CompanyProfile, CompanyRecord, NewsItem, Quote, SentimentLabel};
use equity_agents::testing::{InMemoryDataSource, StaticDocuments, StaticNewsSearch};
use equity_agents::{
    AgentClients, AnalysisConfig, AnalysisError, Recommendation, Report, Supervisor,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

fn company(symbol: &str, sector: &str, price: f64, eps: f64) -> CompanyRecord {
    let mut record = CompanyRecord::new(symbol);
    record.company = Some(CompanyProfile {
        symbol: symbol.into(),
        name: Some(format!("{symbol} Limited")),
        sector: Some(sector.into()),
        description: None,
    });
    record.quote = Some(Quote {
        price: Some(price),
        eps: Some(eps),
        pe_ratio: Some(price / eps),
        ..Quote::default()
    });
    record
}

fn data_script(symbol: &str, with_peers: bool) -> Vec<ScriptedTurn> {
    let mut calls = vec![("get_company_data", json!({ "symbol": symbol }))];
    if with_peers {
        calls.push(("get_sector_peers", json!({ "symbol": symbol })));
    }
    vec![ScriptedTurn::tools(calls), ScriptedTurn::answer("Collected.")]
}

fn research_script(symbol: &str, score: f64) -> Vec<ScriptedTurn> {
    let answer = json!({
        "sentiment_score": score,
        "key_events": [format!("{symbol} announced results")],
        "risks_identified": ["Circular debt"],
        "opportunities": ["New discoveries"],
    });
    vec![
        ScriptedTurn::tools([("search_news", json!({ "query": symbol }))]),
        ScriptedTurn::answer(answer.to_string()),
    ]
}

fn analyst_script(
    eps: f64,
    sector_pe: f64,
    price: f64,
    recommendation: Option<&str>,
    confidence: f64,
) -> Vec<ScriptedTurn> {
    let fair_value = eps * sector_pe;
    let mut answer = json!({
        "health_score": 70,
        "valuations": [{"method": "P/E Valuation", "value": fair_value}],
        "fair_value": fair_value,
        "current_price": price,
        "confidence": confidence,
        "strengths": ["Debt free"],
        "reasoning": "Trades below sector multiple.",
    });
    if let Some(recommendation) = recommendation {
        answer["recommendation"] = Value::from(recommendation);
    }
    vec![
        ScriptedTurn::tools([
            (
                "calculate_pe_valuation",
                json!({ "eps": eps, "sector_pe": sector_pe }),
            ),
            (
                "calculate_margin_of_safety",
                json!({ "fair_value": fair_value, "current_price": price }),
            ),
        ]),
        ScriptedTurn::answer(format!("Here is my analysis:\n```json\n{answer}\n```")),
    ]
}

struct Scripts {
    data: ScriptedClient,
    research: ScriptedClient,
    analyst: ScriptedClient,
}

impl Scripts {
    fn new() -> Self {
        Self {
            data: ScriptedClient::new(),
            research: ScriptedClient::new(),
            analyst: ScriptedClient::new(),
        }
    }

    fn symbol(
        mut self,
        symbol: &str,
        data: Vec<ScriptedTurn>,
        research: Vec<ScriptedTurn>,
        analyst: Vec<ScriptedTurn>,
    ) -> Self {
        self.data = self.data.for_subject(symbol, data);
        self.research = self.research.for_subject(symbol, research);
        self.analyst = self.analyst.for_subject(symbol, analyst);
        self
    }

    fn clients(self, synthesis: Option<ScriptedClient>) -> AgentClients {
        let synthesis = synthesis.map(|c| Arc::new(c) as Arc<dyn ReasoningClient>);
        AgentClients {
            data: Arc::new(self.data),
            research: Arc::new(self.research),
            analyst: Arc::new(self.analyst),
            synthesis,
            summarizer: Arc::new(ScriptedClient::new()),
        }
    }
}

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("equity_agents=debug,agent_runtime=info"))
        .with_test_writer()
        .try_init();
}

fn supervisor(
    clients: AgentClients,
    source: InMemoryDataSource,
    config: AnalysisConfig,
) -> Result<Supervisor> {
    init_test_logging();
    let news = StaticNewsSearch::new().with_items(
        "OGDC",
        vec![NewsItem {
            title: "OGDC production update".into(),
            url: "https://news.example/ogdc".into(),
            ..NewsItem::default()
        }],
    );

    Ok(Supervisor::builder()
        .config(config)
        .clients(clients)
        .data_source(Arc::new(source))
        .news(Arc::new(news))
        .documents(Arc::new(StaticDocuments::new()))
        .build()?)
}

fn oil_and_gas() -> InMemoryDataSource {
    InMemoryDataSource::new()
        .with_company(company("OGDC", "Oil & Gas", 120.0, 20.0))
        .with_company(company("PPL", "Oil & Gas", 100.0, 15.0))
        .with_company(company("MARI", "Oil & Gas", 1800.0, 300.0))
        .with_sector_averages("Oil & Gas", [("pe_ratio", 7.0), ("dividend_yield", 8.5)])
}

fn oil_and_gas_scripts() -> Scripts {
    Scripts::new()
        .symbol(
            "OGDC",
            data_script("OGDC", true),
            research_script("OGDC", 0.3),
            analyst_script(20.0, 7.0, 120.0, Some("BUY"), 0.7),
        )
        .symbol(
            "PPL",
            data_script("PPL", true),
            research_script("PPL", 0.0),
            analyst_script(15.0, 7.0, 100.0, Some("HOLD"), 0.6),
        )
        .symbol(
            "MARI",
            data_script("MARI", true),
            research_script("MARI", 0.4),
            analyst_script(300.0, 7.0, 1800.0, Some("BUY"), 0.8),
        )
}

#[tokio::test]
async fn single_symbol_analysis_recommends_buy() -> Result<()> {
    let mut lsecl = company("LSECL", "Leasing", 5.17, 0.63);
    if let Some(quote) = lsecl.quote.as_mut() {
        quote.pe_ratio = Some(8.2);
    }
    let source = InMemoryDataSource::new()
        .with_company(lsecl)
        .with_company(company("PSMC", "Leasing", 280.0, 35.0))
        .with_company(company("HCAR", "Leasing", 260.0, 30.0))
        .with_sector_averages("Leasing", [("pe_ratio", 8.0)]);

    // Research finds nothing: no news in the answer and none from the search
    let research = vec![
        ScriptedTurn::tools([("search_news", json!({ "query": "LSECL" }))]),
        ScriptedTurn::answer(r#"{"key_events": [], "risks_identified": ["Thin trading"]}"#),
    ];
    let analyst = Arc::new(
        ScriptedClient::new().for_subject("LSECL", analyst_script(0.75, 8.0, 5.17, None, 0.65)),
    );
    let synthesis = ScriptedClient::new().then_answer(
        r#"{"summary": "LSECL trades below its fair value.", "key_findings": ["16% margin of safety"], "risks": ["Small float"]}"#,
    );
    let mut clients = Scripts::new()
        .symbol("LSECL", data_script("LSECL", true), research, vec![])
        .clients(Some(synthesis));
    clients.analyst = analyst.clone();

    let supervisor = supervisor(clients, source, AnalysisConfig::default())?;
    let report = supervisor.analyze("Should I buy LSECL?").await?;

    let Report::Analysis(analysis_report) = &report else {
        panic!("expected an analysis report");
    };
    assert_eq!(report.symbols(), ["LSECL"]);
    assert_eq!(report.recommendation(), Recommendation::Buy);
    assert!((report.overview().confidence - 0.65).abs() < 1e-9);
    assert!(report.overview().synthesized);
    assert_eq!(report.overview().summary, "LSECL trades below its fair value.");

    let slot = analysis_report.state.slot("LSECL").expect("LSECL slot");
    let data = slot.data.as_ref().expect("data output");
    assert_eq!(data.price(), Some(5.17));
    assert_eq!(data.quote.as_ref().and_then(|q| q.pe_ratio), Some(8.2));
    let mut peers = data.peers.clone();
    peers.sort();
    assert_eq!(peers, vec!["HCAR", "PSMC"]);
    assert_eq!(data.sector.as_deref(), Some("Leasing"));

    let research = slot.research.as_ref().expect("research output");
    assert!(research.news_items.is_empty());
    assert_eq!(research.sentiment, SentimentLabel::Neutral);

    let analysis = slot.analysis.as_ref().expect("analyst output");
    assert_eq!(analysis.fair_value, Some(6.0));
    let margin = analysis.margin_of_safety.expect("margin of safety");
    assert!((margin - 16.0).abs() < 0.1, "margin was {margin}");
    assert_eq!(analysis.recommendation, Recommendation::Buy);
    assert_eq!(analysis.health_score, 70);

    // The analyst saw the versioned data and research digests
    let transcripts = analyst.transcripts().await;
    let opening = transcripts[0][0].text().unwrap_or_default();
    assert!(opening.starts_with("Analyze LSECL"));
    assert!(opening.contains("[digest v1]"));
    assert!(opening.contains("Sentiment: neutral"));

    let markdown = report.to_markdown();
    assert!(markdown.contains("**BUY** (Confidence: 65%)"));
    assert!(markdown.contains("- Margin of safety: +16.05%"));

    let json: Value = serde_json::from_str(&report.to_json()?)?;
    assert_eq!(json["type"], "analysis");
    assert_eq!(json["recommendation"], "BUY");

    let metrics = supervisor.metrics().summary();
    assert_eq!(metrics.by_agent["data"].tool_calls, 2);
    assert_eq!(metrics.by_agent["analyst"].tool_calls, 2);
    assert_eq!(metrics.failed_tool_calls, 0);
    Ok(())
}

#[tokio::test]
async fn metrics_cover_only_the_latest_request() -> Result<()> {
    let mut scripts = Scripts::new();
    for _ in 0..2 {
        scripts = scripts.symbol(
            "PPL",
            data_script("PPL", true),
            research_script("PPL", 0.1),
            analyst_script(15.0, 7.0, 100.0, Some("HOLD"), 0.6),
        );
    }
    let supervisor = supervisor(scripts.clients(None), oil_and_gas(), AnalysisConfig::default())?;

    supervisor.analyze("Analyze PPL").await?;
    let first = supervisor.metrics().summary();
    supervisor.analyze("Analyze PPL").await?;
    let second = supervisor.metrics().summary();

    // two turns each for data, research and analyst
    assert_eq!(first.reasoning_calls, 6);
    assert_eq!(first.tool_calls, 5);
    assert_eq!(second.reasoning_calls, first.reasoning_calls);
    assert_eq!(second.tool_calls, first.tool_calls);
    Ok(())
}

#[tokio::test]
async fn comparison_ranks_every_symbol() -> Result<()> {
    let supervisor = supervisor(
        oil_and_gas_scripts().clients(None),
        oil_and_gas(),
        AnalysisConfig::default(),
    )?;

    let report = supervisor.analyze("Compare OGDC, PPL and MARI").await?;
    let Report::Comparison(comparison) = &report else {
        panic!("expected a comparison report");
    };

    assert_eq!(report.symbols(), ["OGDC", "PPL", "MARI"]);
    let order: Vec<&str> = comparison.rankings.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(order, vec!["MARI", "OGDC", "PPL"]);
    assert_eq!(comparison.winner.as_deref(), Some("MARI"));

    assert_eq!(report.recommendation(), Recommendation::Buy);
    assert!((report.overview().confidence - 0.7).abs() < 1e-9);
    assert!(!report.overview().synthesized);

    let ogdc = comparison.state.slot("OGDC").expect("OGDC slot");
    let peers = &ogdc.data.as_ref().expect("data output").peers;
    assert_eq!(peers, &vec!["MARI".to_string(), "PPL".to_string()]);
    assert_eq!(
        ogdc.data.as_ref().expect("data output").sector_averages["pe_ratio"],
        7.0
    );

    let markdown = report.to_markdown();
    assert!(markdown.contains("**Best Pick: MARI**"));
    assert!(markdown.contains("| OGDC | 120.00 | 140.00 | +16.67% | 70 | BUY |"));
    Ok(())
}

#[tokio::test]
async fn slow_symbol_is_flagged_while_others_complete() -> Result<()> {
    let scripts = Scripts::new()
        .symbol(
            "OGDC",
            data_script("OGDC", false),
            research_script("OGDC", 0.3),
            analyst_script(20.0, 7.0, 120.0, Some("BUY"), 0.7),
        )
        .symbol(
            "PPL",
            data_script("PPL", false),
            research_script("PPL", 0.0),
            analyst_script(15.0, 7.0, 100.0, Some("HOLD"), 0.6),
        )
        .symbol(
            "MARI",
            data_script("MARI", false),
            research_script("MARI", 0.4),
            analyst_script(300.0, 7.0, 1800.0, Some("BUY"), 0.8),
        );
    let source = oil_and_gas().with_delay("PPL", Duration::from_secs(30));
    let config = AnalysisConfig::builder()
        .agent_timeout(Some(Duration::from_millis(500)))
        .build()?;
    let supervisor = supervisor(scripts.clients(None), source, config)?;

    let report = supervisor.compare(&["OGDC", "PPL", "MARI"]).await?;
    let Report::Comparison(comparison) = &report else {
        panic!("expected a comparison report");
    };

    assert_eq!(report.symbols(), ["OGDC", "MARI"]);
    let order: Vec<&str> = comparison.rankings.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(order, vec!["MARI", "OGDC"]);

    let ppl = comparison.state.slot("PPL").expect("PPL slot");
    assert!(!ppl.has_data());
    assert!(ppl.research.is_none());
    assert!(ppl.analysis.is_none());
    assert!(ppl.data_gaps.iter().any(|g| g.starts_with("data: Deadline exceeded")));

    let gaps = &report.overview().data_gaps;
    assert!(gaps.contains(&"PPL: no quote or company data".to_string()));
    assert!(comparison.state.errors.iter().any(|e| e.starts_with("PPL:")));
    Ok(())
}

#[tokio::test]
async fn unknown_symbols_fail_the_request() -> Result<()> {
    let scripts = Scripts::new().symbol("ZZZZ", data_script("ZZZZ", true), vec![], vec![]);
    let supervisor = supervisor(scripts.clients(None), oil_and_gas(), AnalysisConfig::default())?;

    let err = supervisor
        .analyze("Should I buy ZZZZ?")
        .await
        .expect_err("no symbol has data");
    assert!(matches!(err, AnalysisError::Agent(Error::NoSymbolsResolved(_))));
    Ok(())
}

#[tokio::test]
async fn unparseable_analysis_leaves_a_gap() -> Result<()> {
    let scripts = Scripts::new().symbol(
        "PPL",
        data_script("PPL", true),
        research_script("PPL", 0.1),
        vec![ScriptedTurn::answer(r#"{"recommendation": "MAYBE"}"#)],
    );
    let supervisor = supervisor(scripts.clients(None), oil_and_gas(), AnalysisConfig::default())?;

    let report = supervisor.analyze("Analyze PPL").await?;
    let slot = report.state().slot("PPL").expect("PPL slot");
    assert!(slot.analysis.is_none());
    assert!(slot.research.is_some());
    assert!(slot.data_gaps.iter().any(|g| g.starts_with("analysis: ")));
    assert_eq!(report.recommendation(), Recommendation::Hold);
    assert!((report.overview().confidence - 0.0).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn identical_inputs_give_identical_results() -> Result<()> {
    let mut runs = Vec::new();
    for _ in 0..2 {
        let supervisor = supervisor(
            oil_and_gas_scripts().clients(None),
            oil_and_gas(),
            AnalysisConfig::default(),
        )?;
        runs.push(supervisor.compare(&["PPL", "MARI", "OGDC"]).await?);
    }

    let (Report::Comparison(first), Report::Comparison(second)) = (&runs[0], &runs[1]) else {
        panic!("expected comparison reports");
    };
    assert_eq!(first.rankings, second.rankings);
    assert_eq!(first.state, second.state);
    assert_eq!(first.overview.summary, second.overview.summary);
    assert_eq!(first.overview.data_gaps, second.overview.data_gaps);
    assert_ne!(first.overview.id, second.overview.id);
    Ok(())
}
