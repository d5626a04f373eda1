//! Query classification

use crate::error::{AnalysisError, Result};
use agent_core::Error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Kind of request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// A single symbol, analysed in depth
    Analysis,
    /// Several symbols, ranked against each other
    Comparison,
}

/// Symbols and kind resolved from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub symbols: Vec<String>,
    pub kind: RequestKind,
}

/// Words that look like tickers but are not
const STOP_WORDS: &[&str] = &[
    "THE", "AND", "FOR", "BUY", "SELL", "HOLD", "STOCK", "STOCKS", "SHOULD", "WHAT", "WHICH",
    "WITH", "ABOUT", "FROM", "THIS", "THAT", "SHARE", "SHARES", "PRICE", "BETTER", "VERSUS",
    "COMPARE", "ANALYZE", "ANALYSE", "ANALYSIS", "VALUE", "WORTH", "INVEST", "GOOD", "BEST",
    "NOW", "TODAY", "ARE", "HOW", "WHY", "DOES", "CAN", "YOU", "GIVE", "TELL", "ME", "MY",
    "PSX", "KSE", "CEO", "EPS", "ROE", "LTD", "PKR", "USD", "IPO", "AGM",
];

const COMPARISON_KEYWORDS: &[&str] = &["compare", "versus", "vs", "better", "which"];

/// Resolves ticker symbols and request kind from a query
#[derive(Debug, Clone)]
pub struct QueryRouter {
    symbol_pattern: Regex,
    stop_words: HashSet<&'static str>,
}

impl QueryRouter {
    pub fn new() -> Result<Self> {
        let symbol_pattern = Regex::new(r"\b([A-Z]{3,6})\b")
            .map_err(|e| AnalysisError::Config(format!("invalid symbol pattern: {e}")))?;
        Ok(Self {
            symbol_pattern,
            stop_words: STOP_WORDS.iter().copied().collect(),
        })
    }

    fn candidates(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.symbol_pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|word| !self.stop_words.contains(word))
            .filter(|word| seen.insert(*word))
            .map(str::to_string)
            .collect()
    }

    /// Classify a natural-language query
    ///
    /// Uppercase tokens are taken as written; a query without any is
    /// uppercased first, so "analyze ppl" still resolves.
    pub fn classify(&self, query: &str) -> Result<Classification> {
        let mut symbols = self.candidates(query);
        if symbols.is_empty() {
            symbols = self.candidates(&query.to_uppercase());
        }
        if symbols.is_empty() {
            return Err(Error::NoSymbolsResolved(query.to_string()).into());
        }

        let lowered = query.to_lowercase();
        let keyword = lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| COMPARISON_KEYWORDS.contains(&word));
        let kind = if keyword || symbols.len() > 1 {
            RequestKind::Comparison
        } else {
            RequestKind::Analysis
        };

        debug!(query = %query, symbols = ?symbols, kind = ?kind, "Query classified");
        Ok(Classification { symbols, kind })
    }

    /// Classify an explicit symbol list
    pub fn classify_symbols<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Classification> {
        let mut seen = HashSet::new();
        let symbols: Vec<String> = symbols
            .iter()
            .map(|s| s.as_ref().trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.clone()))
            .collect();
        if symbols.is_empty() {
            return Err(Error::NoSymbolsResolved("empty symbol list".to_string()).into());
        }
        let kind = if symbols.len() > 1 {
            RequestKind::Comparison
        } else {
            RequestKind::Analysis
        };
        Ok(Classification { symbols, kind })
    }
}
