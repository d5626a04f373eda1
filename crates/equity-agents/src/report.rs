//! Final reports and their renderings

use crate::error::Result;
use crate::models::Recommendation;
use crate::output::AnalystOutput;
use crate::ranking::Ranking;
use crate::state::AnalysisState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use uuid::Uuid;

/// Fields shared by every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOverview {
    pub id: Uuid,
    pub query: String,
    /// Requested symbols that produced data, in request order
    pub symbols: Vec<String>,
    pub summary: String,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub key_findings: Vec<String>,
    pub risks: Vec<String>,
    pub data_gaps: Vec<String>,
    /// Narrative written by the model rather than assembled
    pub synthesized: bool,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub overview: ReportOverview,
    pub state: AnalysisState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    #[serde(flatten)]
    pub overview: ReportOverview,
    pub rankings: Vec<Ranking>,
    pub winner: Option<String>,
    pub state: AnalysisState,
}

/// Result of one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Report {
    Analysis(AnalysisReport),
    Comparison(ComparisonReport),
}

fn num(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn bullets(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "## {title}\n");
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
}

fn analysis_section(out: &mut String, analysis: &AnalystOutput) {
    let _ = writeln!(out, "## {}\n", analysis.symbol);
    let _ = writeln!(
        out,
        "**{}** (Confidence: {:.0}%) | Health Score: {}/100\n",
        analysis.recommendation,
        analysis.confidence * 100.0,
        analysis.health_score
    );

    out.push_str("### Valuation\n\n");
    let _ = writeln!(out, "- Fair value: {}", num(analysis.fair_value));
    let _ = writeln!(out, "- Current price: {}", num(analysis.current_price));
    let _ = writeln!(
        out,
        "- Margin of safety: {}",
        analysis
            .margin_of_safety
            .map_or_else(|| "N/A".to_string(), |m| format!("{m:+.2}%"))
    );
    if !analysis.valuations.is_empty() {
        out.push_str("\n| Method | Value |\n|---|---|\n");
        for valuation in &analysis.valuations {
            let _ = writeln!(out, "| {} | {:.2} |", valuation.method, valuation.value);
        }
    }
    out.push('\n');

    if !analysis.strengths.is_empty() {
        out.push_str("### Strengths\n\n");
        for item in &analysis.strengths {
            let _ = writeln!(out, "- {item}");
        }
        out.push('\n');
    }
    if !analysis.red_flags.is_empty() {
        out.push_str("### Red Flags\n\n");
        for item in &analysis.red_flags {
            let _ = writeln!(out, "- {item}");
        }
        out.push('\n');
    }
    if !analysis.reasoning.is_empty() {
        let _ = writeln!(out, "{}\n", analysis.reasoning);
    }
}

impl Report {
    pub fn overview(&self) -> &ReportOverview {
        match self {
            Self::Analysis(r) => &r.overview,
            Self::Comparison(r) => &r.overview,
        }
    }

    pub fn state(&self) -> &AnalysisState {
        match self {
            Self::Analysis(r) => &r.state,
            Self::Comparison(r) => &r.state,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.overview().symbols
    }

    pub fn recommendation(&self) -> Recommendation {
        self.overview().recommendation
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_markdown(&self) -> String {
        match self {
            Self::Analysis(report) => analysis_markdown(report),
            Self::Comparison(report) => comparison_markdown(report),
        }
    }
}

fn analysis_markdown(report: &AnalysisReport) -> String {
    let o = &report.overview;
    let mut out = String::from("# Stock Analysis Report\n\n");
    let _ = writeln!(out, "**Query:** {}", o.query);
    let _ = writeln!(out, "**Generated:** {}\n", o.generated_at.format("%Y-%m-%d %H:%M UTC"));

    let _ = writeln!(out, "## Summary\n\n{}\n", o.summary);
    let _ = writeln!(
        out,
        "## Recommendation\n\n**{}** (Confidence: {:.0}%)\n",
        o.recommendation,
        o.confidence * 100.0
    );
    bullets(&mut out, "Key Findings", &o.key_findings);
    bullets(&mut out, "Risks", &o.risks);

    for analysis in report.state.analyses() {
        analysis_section(&mut out, analysis);
    }
    bullets(&mut out, "Data Gaps", &o.data_gaps);
    out
}

fn comparison_markdown(report: &ComparisonReport) -> String {
    let o = &report.overview;
    let mut out = String::from("# Stock Comparison Report\n\n");
    let _ = writeln!(out, "**Comparing:** {}", o.symbols.join(", "));
    let _ = writeln!(out, "**Generated:** {}\n", o.generated_at.format("%Y-%m-%d %H:%M UTC"));

    let _ = writeln!(out, "## Summary\n\n{}\n", o.summary);
    if let Some(winner) = &report.winner {
        let _ = writeln!(out, "**Best Pick: {winner}**\n");
    }

    if !report.rankings.is_empty() {
        out.push_str("## Rankings\n\n");
        for ranking in &report.rankings {
            let _ = writeln!(
                out,
                "{}. **{}** - {} (Confidence: {:.0}%)",
                ranking.rank,
                ranking.symbol,
                ranking.recommendation,
                ranking.confidence * 100.0
            );
        }
        out.push('\n');

        out.push_str("## Comparison Table\n\n");
        out.push_str("| Symbol | Price | Fair Value | Margin of Safety | Health | Recommendation |\n");
        out.push_str("|---|---|---|---|---|---|\n");
        for ranking in &report.rankings {
            let analysis = report
                .state
                .slot(&ranking.symbol)
                .and_then(|s| s.analysis.as_ref());
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                ranking.symbol,
                num(analysis.and_then(|a| a.current_price)),
                num(analysis.and_then(|a| a.fair_value)),
                ranking
                    .margin_of_safety
                    .map_or_else(|| "N/A".to_string(), |m| format!("{m:+.2}%")),
                ranking.health_score,
                ranking.recommendation
            );
        }
        out.push('\n');
    }

    bullets(&mut out, "Key Findings", &o.key_findings);
    bullets(&mut out, "Risks", &o.risks);
    bullets(&mut out, "Data Gaps", &o.data_gaps);
    out
}
