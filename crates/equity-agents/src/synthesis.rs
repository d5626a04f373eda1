//! Final narrative over the whole analysis state

use crate::digest::state_digest;
use crate::models::Recommendation;
use crate::parser::{extract_json, string_list};
use crate::state::AnalysisState;
use agent_core::{Error, Result};
use agent_runtime::OneShot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub const SYNTHESIS_PROMPT: &str = r#"You are the lead equity analyst. Using the collected data,
research and analysis below, write the investment summary.

Answer with JSON only:
{
    "summary": "3-5 sentences: overall view, valuation, main drivers",
    "key_findings": ["..."],
    "risks": ["..."]
}"#;

/// Narrative part of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    pub summary: String,
    pub key_findings: Vec<String>,
    pub risks: Vec<String>,
    /// Written by the model rather than assembled from the state
    pub generated: bool,
}

/// Majority recommendation across analyses and their mean confidence
///
/// Ties go to the recommendation seen first in request order. Without any
/// analysis the result is HOLD with zero confidence.
pub fn overall_recommendation(state: &AnalysisState) -> (Recommendation, f64) {
    let mut counts: Vec<(Recommendation, usize)> = Vec::new();
    let mut confidence_sum = 0.0;
    let mut n = 0usize;

    for analysis in state.analyses() {
        match counts.iter_mut().find(|(r, _)| *r == analysis.recommendation) {
            Some((_, count)) => *count += 1,
            None => counts.push((analysis.recommendation, 1)),
        }
        confidence_sum += analysis.confidence;
        n += 1;
    }

    let mut best: Option<(Recommendation, usize)> = None;
    for (recommendation, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((recommendation, count));
        }
    }

    match best {
        Some((recommendation, _)) => (recommendation, confidence_sum / n as f64),
        None => (Recommendation::Hold, 0.0),
    }
}

/// Summary built from the state alone
pub fn fallback(state: &AnalysisState) -> Synthesis {
    let mut key_findings = Vec::new();
    let mut risks = Vec::new();
    let mut parts = Vec::new();

    for symbol in &state.requested {
        let Some(slot) = state.slot(symbol) else {
            continue;
        };
        if let Some(analysis) = &slot.analysis {
            parts.push(format!(
                "{symbol} rated {} ({:.0}% confidence)",
                analysis.recommendation,
                analysis.confidence * 100.0
            ));
            if let Some(margin) = analysis.margin_of_safety {
                key_findings.push(format!("{symbol}: margin of safety {margin:+.2}%"));
            }
            key_findings.push(format!("{symbol}: health score {}/100", analysis.health_score));
            risks.extend(analysis.red_flags.iter().map(|f| format!("{symbol}: {f}")));
        } else if slot.has_data() {
            parts.push(format!("{symbol} has data but no completed analysis"));
        }
        if let Some(research) = &slot.research {
            risks.extend(research.risks_identified.iter().map(|r| format!("{symbol}: {r}")));
        }
    }

    let summary = if parts.is_empty() {
        format!("No analysis could be completed for: {}.", state.requested.join(", "))
    } else {
        format!("{}.", parts.join("; "))
    };

    Synthesis {
        summary,
        key_findings,
        risks,
        generated: false,
    }
}

fn parse(answer: &str) -> Result<Synthesis> {
    let value = extract_json(answer)?;
    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::OutputParse("synthesis has no summary".to_string()))?;
    Ok(Synthesis {
        summary: summary.to_string(),
        key_findings: string_list(&value, "key_findings"),
        risks: string_list(&value, "risks"),
        generated: true,
    })
}

/// Writes the report narrative with a single reasoning call
pub struct Synthesizer {
    oneshot: Option<Arc<OneShot>>,
}

impl Synthesizer {
    pub fn new(oneshot: Arc<OneShot>) -> Self {
        Self {
            oneshot: Some(oneshot),
        }
    }

    /// Always use the assembled summary
    pub fn deterministic() -> Self {
        Self { oneshot: None }
    }

    /// Model-written synthesis, or the assembled one when that fails
    pub async fn synthesize(&self, state: &AnalysisState) -> Synthesis {
        let Some(oneshot) = &self.oneshot else {
            return fallback(state);
        };

        let prompt = format!("{SYNTHESIS_PROMPT}\n\n{}", state_digest(state));
        let attempt = match oneshot.ask(prompt).await {
            Ok((answer, usage)) => {
                info!(tokens = usage.total(), "Synthesis response received");
                parse(&answer)
            }
            Err(e) => Err(e),
        };

        attempt.unwrap_or_else(|e| {
            warn!(error = %e, "Synthesis failed, using assembled summary");
            fallback(state)
        })
    }
}
