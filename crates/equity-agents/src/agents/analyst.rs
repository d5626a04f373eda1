//! Analyst specialist

use crate::models::{PeerComparison, Recommendation, Valuation};
use crate::output::AnalystOutput;
use crate::parser::{extract_json, number, string_list};
use crate::tools::{
    ANALYZE_FINANCIAL_HEALTH, CALCULATE_DCF, CALCULATE_GRAHAM_NUMBER, CALCULATE_MARGIN_OF_SAFETY,
    CALCULATE_PE_VALUATION, COMPARE_WITH_SECTOR,
};
use crate::valuation;
use agent_core::{Error, Result};
use agent_runtime::{AgentTask, ExtractionStrategy, Extractor, ObservationMap};
use serde::Deserialize;
use serde_json::Value;

pub const NAME: &str = "analyst";

pub const TOOLS: &[&str] = &[
    CALCULATE_PE_VALUATION,
    CALCULATE_GRAHAM_NUMBER,
    CALCULATE_DCF,
    CALCULATE_MARGIN_OF_SAFETY,
    ANALYZE_FINANCIAL_HEALTH,
    COMPARE_WITH_SECTOR,
];

pub const SYSTEM_PROMPT: &str = r#"You are a financial analyst doing fundamental analysis of listed stocks.

Responsibilities:
1. Value the company with several methods (P/E, Graham number, DCF when cash flows are known)
2. Analyze financial health and detect red flags
3. Compare the company with its sector averages and peers
4. Recommend with reasoning

Be conservative, prefer underestimating value. Always compute the margin of safety with
calculate_margin_of_safety once you settle on a fair value. If data is insufficient, say
what is missing.

Recommendation scale (margin of safety as percent of price):
- STRONG_BUY: above 30% with strong fundamentals
- BUY: 15% to 30%
- HOLD: 0% to 15%, or mixed signals
- SELL: negative margin
- STRONG_SELL: below -30% or serious red flags

When done, answer with JSON only:
{
    "symbol": "...",
    "health_score": 0-100,
    "valuations": [{"method": "...", "value": 0.0, "notes": "..."}],
    "fair_value": 0.0,
    "current_price": 0.0,
    "margin_of_safety": 0.0,
    "red_flags": ["..."],
    "strengths": ["..."],
    "peer_comparison": [{"symbol": "...", "price": 0.0, "pe_ratio": 0.0}],
    "recommendation": "STRONG_BUY|BUY|HOLD|SELL|STRONG_SELL",
    "confidence": 0.0-1.0,
    "reasoning": "..."
}"#;

const DEFAULT_CONFIDENCE: f64 = 0.5;
const DEFAULT_HEALTH_SCORE: u8 = 50;

/// Task for one symbol, carrying the data and research digest as context
pub fn task(symbol: &str, context: &str) -> AgentTask {
    AgentTask::new(
        symbol,
        format!("Analyze {symbol}: value it, assess financial health and recommend."),
    )
    .with_context(context)
}

fn valuations(value: &Value) -> Vec<Valuation> {
    let Some(items) = value.get("valuations").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            Some(Valuation {
                method: item.get("method")?.as_str()?.to_string(),
                value: number(item, "value").or_else(|| number(item, "fair_value"))?,
                notes: item.get("notes").and_then(Value::as_str).map(str::to_string),
            })
        })
        .collect()
}

fn is_ticker(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Accepts a list of rows or an object keyed by symbol
fn peer_comparison(value: &Value) -> Vec<PeerComparison> {
    match value.get("peer_comparison") {
        Some(Value::Array(rows)) => rows
            .iter()
            .filter_map(|row| PeerComparison::deserialize(row).ok())
            .filter(|row| !row.symbol.is_empty())
            .collect(),
        Some(Value::Object(by_symbol)) => by_symbol
            .iter()
            .filter(|(key, _)| is_ticker(key))
            .filter_map(|(key, row)| {
                let mut peer = PeerComparison::deserialize(row).ok()?;
                if peer.symbol.is_empty() {
                    peer.symbol.clone_from(key);
                }
                Some(peer)
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Parses the analyst answer into [`AnalystOutput`]
///
/// Fields the answer leaves out are recovered from the calculator
/// observations where possible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalystExtractor;

impl Extractor for AnalystExtractor {
    type Output = AnalystOutput;

    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Generative
    }

    fn parse(
        &self,
        subject: &str,
        answer: &str,
        observations: &ObservationMap,
    ) -> Result<AnalystOutput> {
        let value = extract_json(answer)?;
        let health = super::payload(observations, ANALYZE_FINANCIAL_HEALTH);
        let margin_tool = super::payload(observations, CALCULATE_MARGIN_OF_SAFETY);

        let health_score = match number(&value, "health_score") {
            Some(score) if (0.0..=100.0).contains(&score) => score.round() as u8,
            Some(score) => {
                return Err(Error::OutputParse(format!(
                    "health_score {score} for {subject} is outside [0, 100]"
                )));
            }
            None => health
                .and_then(|h| number(h, "health_score"))
                .map_or(DEFAULT_HEALTH_SCORE, |s| s.clamp(0.0, 100.0).round() as u8),
        };

        let confidence = match number(&value, "confidence") {
            Some(c) if (0.0..=1.0).contains(&c) => c,
            Some(c) => {
                return Err(Error::OutputParse(format!(
                    "confidence {c} for {subject} is outside [0, 1]"
                )));
            }
            None => DEFAULT_CONFIDENCE,
        };

        let fair_value =
            number(&value, "fair_value").or_else(|| margin_tool.and_then(|m| number(m, "fair_value")));
        let current_price = number(&value, "current_price")
            .or_else(|| margin_tool.and_then(|m| number(m, "current_price")));
        let margin_of_safety = number(&value, "margin_of_safety")
            .or_else(|| margin_tool.and_then(|m| number(m, "margin_of_safety_pct")))
            .or_else(|| {
                fair_value
                    .zip(current_price)
                    .and_then(|(fair, price)| valuation::margin_of_safety(fair, price))
            });

        let recommendation = match value.get("recommendation") {
            Some(Value::String(text)) => text.parse::<Recommendation>().map_err(|e| {
                Error::OutputParse(format!("{e} for {subject}"))
            })?,
            Some(Value::Null) | None => Recommendation::from_margin(margin_of_safety),
            Some(other) => {
                return Err(Error::OutputParse(format!(
                    "recommendation for {subject} is not a string: {other}"
                )));
            }
        };

        let mut red_flags = string_list(&value, "red_flags");
        if red_flags.is_empty() {
            red_flags = health.map(|h| string_list(h, "red_flags")).unwrap_or_default();
        }
        let mut strengths = string_list(&value, "strengths");
        if strengths.is_empty() {
            strengths = health.map(|h| string_list(h, "strengths")).unwrap_or_default();
        }

        Ok(AnalystOutput {
            symbol: subject.to_string(),
            health_score,
            valuations: valuations(&value),
            fair_value,
            current_price,
            margin_of_safety,
            red_flags,
            strengths,
            peer_comparison: peer_comparison(&value),
            recommendation,
            confidence,
            reasoning: value
                .get("reasoning")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{ToolInvocation, ToolObservation};
    use serde_json::json;

    fn observed(entries: &[(&str, Value)]) -> ObservationMap {
        entries
            .iter()
            .map(|(tool, payload)| {
                let invocation = ToolInvocation::with_id("1", *tool, json!({}));
                (
                    (*tool).to_string(),
                    ToolObservation::success(&invocation, payload.clone()),
                )
            })
            .collect()
    }

    #[test]
    fn test_margin_computed_and_recommendation_derived() {
        let answer = r#"{"fair_value": 6.0, "current_price": 5.17, "health_score": 70}"#;
        let output = AnalystExtractor
            .parse("LSECL", answer, &ObservationMap::new())
            .unwrap();

        let margin = output.margin_of_safety.unwrap();
        assert!((margin - 16.05).abs() < 0.01);
        assert_eq!(output.recommendation, Recommendation::Buy);
        assert_eq!(output.confidence, 0.5);
        assert_eq!(output.health_score, 70);
    }

    #[test]
    fn test_fields_recovered_from_observations() {
        let observations = observed(&[
            (
                CALCULATE_MARGIN_OF_SAFETY,
                json!({"fair_value": 240.0, "current_price": 160.0, "margin_of_safety_pct": 50.0}),
            ),
            (
                ANALYZE_FINANCIAL_HEALTH,
                json!({"health_score": 80, "red_flags": [], "strengths": ["High ROE (25%)"]}),
            ),
        ]);

        let output = AnalystExtractor
            .parse("PPL", r#"{"reasoning": "cheap"}"#, &observations)
            .unwrap();
        assert_eq!(output.fair_value, Some(240.0));
        assert_eq!(output.current_price, Some(160.0));
        assert_eq!(output.margin_of_safety, Some(50.0));
        assert_eq!(output.recommendation, Recommendation::StrongBuy);
        assert_eq!(output.health_score, 80);
        assert_eq!(output.strengths, vec!["High ROE (25%)"]);
        assert_eq!(output.reasoning, "cheap");
    }

    #[test]
    fn test_no_margin_means_hold() {
        let output = AnalystExtractor
            .parse("MARI", "{}", &ObservationMap::new())
            .unwrap();
        assert_eq!(output.recommendation, Recommendation::Hold);
        assert_eq!(output.health_score, 50);
        assert_eq!(output.margin_of_safety, None);
    }

    #[test]
    fn test_out_of_range_values_are_parse_errors() {
        for answer in [
            r#"{"health_score": 140}"#,
            r#"{"confidence": 1.5}"#,
            r#"{"recommendation": "ACCUMULATE"}"#,
            r#"{"recommendation": 3}"#,
        ] {
            let err = AnalystExtractor
                .parse("OGDC", answer, &ObservationMap::new())
                .unwrap_err();
            assert!(matches!(err, Error::OutputParse(_)), "{answer}");
        }
    }

    #[test]
    fn test_explicit_recommendation_wins() {
        let answer = r#"{"fair_value": 6.0, "current_price": 5.17, "recommendation": "hold", "confidence": 0.8}"#;
        let output = AnalystExtractor
            .parse("LSECL", answer, &ObservationMap::new())
            .unwrap();
        assert_eq!(output.recommendation, Recommendation::Hold);
        assert_eq!(output.confidence, 0.8);
    }

    #[test]
    fn test_peer_comparison_shapes() {
        let list = json!({"peer_comparison": [{"symbol": "PPL", "pe_ratio": 4.2}, {"pe_ratio": 1.0}]});
        assert_eq!(peer_comparison(&list).len(), 1);

        let keyed = json!({"peer_comparison": {
            "PPL": {"pe_ratio": 4.2},
            "MARI": {"pe_ratio": 7.9},
            "summary": {"note": "cheap"},
        }});
        let peers = peer_comparison(&keyed);
        assert_eq!(peers.len(), 2);
        assert!(peers.iter().any(|p| p.symbol == "MARI" && p.pe_ratio == Some(7.9)));
    }

    #[test]
    fn test_valuations_accept_fair_value_key() {
        let answer = json!({"valuations": [
            {"method": "P/E Valuation", "value": 6.0},
            {"method": "Graham Number", "fair_value": "5.5"},
            {"value": 1.0},
        ]});
        let parsed = valuations(&answer);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].value, 5.5);
    }
}
