//! Equity analysis on the agent runtime
//!
//! A supervisor answers "should I buy X?" and "compare X, Y and Z" requests
//! by running three specialists per symbol:
//!
//! - Data: company record, sector peers and sector averages, projected
//!   from tool observations
//! - Research: news, sentiment and report highlights, parsed from the answer
//! - Analyst: valuations, financial health and a recommendation
//!
//! Each specialist sees only the digest of the stages before it. The results
//! are ranked (for comparisons), summarized and returned as a [`Report`] that
//! renders to JSON or markdown.
//!
//! # Example
//!
//! ```rust,ignore
//! use equity_agents::{AgentClients, AnalysisConfig, Supervisor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     agent_utils::init_tracing();
//!     let config = AnalysisConfig::from_env()?;
//!
//!     let supervisor = Supervisor::builder()
//!         .clients(AgentClients::anthropic(&config)?)
//!         .config(config)
//!         .data_source(Arc::new(/* your DataSource */))
//!         .news(Arc::new(/* your NewsSearch */))
//!         .documents(Arc::new(/* your DocumentSource */))
//!         .build()?;
//!
//!     let report = supervisor.analyze("Compare OGDC, PPL and MARI").await?;
//!     println!("{}", report.to_markdown());
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod collaborators;
pub mod config;
pub mod digest;
pub mod error;
pub mod metrics;
pub mod models;
pub mod output;
pub mod parser;
pub mod ranking;
pub mod report;
pub mod router;
pub mod state;
pub mod supervisor;
pub mod synthesis;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tools;
pub mod valuation;

// Re-export main types for convenience
pub use collaborators::{DataSource, DocumentSource, NewsSearch};
pub use config::{AgentRole, AnalysisConfig};
pub use error::{AnalysisError, Result};
pub use metrics::{MetricsCollector, MetricsSummary};
pub use models::{Recommendation, SentimentLabel};
pub use output::{AnalystOutput, DataOutput, ResearchOutput};
pub use ranking::Ranking;
pub use report::{AnalysisReport, ComparisonReport, Report, ReportOverview};
pub use router::{Classification, QueryRouter, RequestKind};
pub use state::{AnalysisState, SymbolSlot};
pub use supervisor::{AgentClients, Supervisor, SupervisorBuilder};
