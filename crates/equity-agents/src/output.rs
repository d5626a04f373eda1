//! Typed specialist outputs

use crate::models::{
    Announcement, CompanyProfile, FinancialRow, Freshness, NewsItem, PeerComparison,
    PeerSnapshot, Quote, RatioRow, Recommendation, ReportDocument, SentimentLabel, Valuation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the data specialist gathered for one symbol
///
/// Built from tool observations, never from the model's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataOutput {
    pub symbol: String,
    pub quote: Option<Quote>,
    pub company: Option<CompanyProfile>,
    pub financials: Vec<FinancialRow>,
    pub ratios: Vec<RatioRow>,
    pub reports: Vec<ReportDocument>,
    pub announcements: Vec<Announcement>,
    pub peers: Vec<String>,
    pub peer_data: Vec<PeerSnapshot>,
    pub sector: Option<String>,
    pub sector_averages: BTreeMap<String, f64>,
    pub data_gaps: Vec<String>,
    pub freshness: Option<Freshness>,
}

impl DataOutput {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// A quote or company profile is present
    pub fn has_core_data(&self) -> bool {
        self.quote.is_some() || self.company.is_some()
    }

    pub fn price(&self) -> Option<f64> {
        self.quote.as_ref().and_then(|q| q.price)
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company.as_ref().and_then(|c| c.name.as_deref())
    }
}

/// News, sentiment and document findings for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchOutput {
    pub symbol: String,
    #[serde(default)]
    pub news_items: Vec<NewsItem>,
    /// -1 to 1
    pub sentiment_score: f64,
    pub sentiment: SentimentLabel,
    #[serde(default)]
    pub key_events: Vec<String>,
    #[serde(default)]
    pub report_highlights: Vec<String>,
    #[serde(default)]
    pub risks_identified: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
}

/// Valuation and recommendation for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystOutput {
    pub symbol: String,
    /// 0 to 100
    pub health_score: u8,
    #[serde(default)]
    pub valuations: Vec<Valuation>,
    pub fair_value: Option<f64>,
    pub current_price: Option<f64>,
    /// Percent of current price
    pub margin_of_safety: Option<f64>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub peer_comparison: Vec<PeerComparison>,
    pub recommendation: Recommendation,
    /// 0 to 1
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}
