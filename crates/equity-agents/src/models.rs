//! Domain records shared by tools, specialists and reports

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Latest market quote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_52_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_52_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

/// Company reference data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyProfile {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One line of a financial statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRow {
    /// "2025", "Q1 2026"
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_type: Option<String>,
    pub metric: String,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioRow {
    pub period: String,
    pub metric: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// A published financial report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    /// "annual" or "quarterly"
    pub report_type: String,
    pub period: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub date: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Quick view of a peer company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerSnapshot {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_margin: Option<f64>,
}

/// Where a company record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Served from the local store
    FromStore,
    /// Fetched upstream because the store had no record
    FreshlyFetched,
}

/// Everything the data source knows about one company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyRecord {
    pub symbol: String,
    pub company: Option<CompanyProfile>,
    pub quote: Option<Quote>,
    pub financials: Vec<FinancialRow>,
    pub ratios: Vec<RatioRow>,
    pub reports: Vec<ReportDocument>,
    pub announcements: Vec<Announcement>,
    #[serde(rename = "data_freshness")]
    pub freshness: Option<Freshness>,
}

impl CompanyRecord {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn sector(&self) -> Option<&str> {
        self.company.as_ref().and_then(|c| c.sector.as_deref())
    }

    /// Snapshot used when this company appears as someone's peer
    pub fn snapshot(&self) -> PeerSnapshot {
        let quote = self.quote.clone().unwrap_or_default();
        PeerSnapshot {
            symbol: self.symbol.clone(),
            name: self.company.as_ref().and_then(|c| c.name.clone()),
            sector: self.sector().map(str::to_string),
            price: quote.price,
            pe_ratio: quote.pe_ratio,
            market_cap: quote.market_cap,
            eps: quote.eps,
            profit_margin: self
                .ratios
                .iter()
                .find(|r| r.metric.to_lowercase().contains("profit margin"))
                .and_then(|r| r.value),
        }
    }
}

/// A news article or search hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// -1 to 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Label for a score in [-1, 1]
    pub fn from_score(score: f64) -> Self {
        if score > 0.2 {
            Self::Positive
        } else if score < -0.2 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" | "bullish" => Some(Self::Positive),
            "neutral" | "mixed" => Some(Self::Neutral),
            "negative" | "bearish" => Some(Self::Negative),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

/// Result of one valuation method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub method: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A peer row as reported by the analyst
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerComparison {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pb_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roe: Option<f64>,
}

/// Investment recommendation, ordered from weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl Recommendation {
    /// Derive a recommendation from a margin of safety in percent
    ///
    /// Above 30 is a strong buy, 15 to 30 a buy, 0 to 15 a hold, down to -30
    /// a sell and anything lower a strong sell. No margin means hold.
    pub fn from_margin(margin_pct: Option<f64>) -> Self {
        match margin_pct {
            Some(m) if m > 30.0 => Self::StrongBuy,
            Some(m) if m >= 15.0 => Self::Buy,
            Some(m) if m >= 0.0 => Self::Hold,
            Some(m) if m >= -30.0 => Self::Sell,
            Some(_) => Self::StrongSell,
            None => Self::Hold,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongSell => "STRONG_SELL",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
            Self::Buy => "BUY",
            Self::StrongBuy => "STRONG_BUY",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = String;

    /// Accepts `STRONG_BUY`, `strong buy`, `Strong-Buy` and the like
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_uppercase() })
            .collect();
        match normalized.as_str() {
            "STRONG_SELL" => Ok(Self::StrongSell),
            "SELL" => Ok(Self::Sell),
            "HOLD" => Ok(Self::Hold),
            "BUY" => Ok(Self::Buy),
            "STRONG_BUY" => Ok(Self::StrongBuy),
            _ => Err(format!("unknown recommendation: {s}")),
        }
    }
}
