//! Ranking analysed symbols against each other

use crate::models::Recommendation;
use crate::output::AnalystOutput;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// 1 is best
    pub rank: usize,
    pub symbol: String,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub health_score: u8,
    pub margin_of_safety: Option<f64>,
}

fn compare(a: &AnalystOutput, b: &AnalystOutput) -> Ordering {
    b.recommendation
        .cmp(&a.recommendation)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Strongest recommendation first, then highest confidence, then symbol
///
/// The order does not depend on input order.
pub fn rank<'a>(analyses: impl IntoIterator<Item = &'a AnalystOutput>) -> Vec<Ranking> {
    let mut sorted: Vec<&AnalystOutput> = analyses.into_iter().collect();
    sorted.sort_by(|a, b| compare(a, b));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, analysis)| Ranking {
            rank: i + 1,
            symbol: analysis.symbol.clone(),
            recommendation: analysis.recommendation,
            confidence: analysis.confidence,
            health_score: analysis.health_score,
            margin_of_safety: analysis.margin_of_safety,
        })
        .collect()
}
