//! In-memory collaborators
//!
//! Useful for tests, demos and offline runs. Nothing here touches the network.
//! Compiled for unit tests and with the `testing` feature.

use crate::collaborators::{DataSource, DocumentSource, NewsSearch};
use crate::error::{AnalysisError, Result};
use crate::models::{CompanyRecord, Freshness, NewsItem, PeerSnapshot};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

/// Data source backed by a map of company records
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    records: BTreeMap<String, CompanyRecord>,
    sector_averages: HashMap<String, BTreeMap<String, f64>>,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a company; records without a freshness tag are served as stored
    pub fn with_company(mut self, mut record: CompanyRecord) -> Self {
        record.freshness.get_or_insert(Freshness::FromStore);
        self.records.insert(record.symbol.clone(), record);
        self
    }

    pub fn with_sector_averages(
        mut self,
        sector: impl Into<String>,
        averages: impl IntoIterator<Item = (&'static str, f64)>,
    ) -> Self {
        self.sector_averages.insert(
            sector.into(),
            averages
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        );
        self
    }

    /// Sleep before answering any lookup for `symbol`
    pub fn with_delay(mut self, symbol: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(symbol.into(), delay);
        self
    }

    /// Make every lookup for `symbol` fail
    pub fn failing(mut self, symbol: impl Into<String>) -> Self {
        self.failing.insert(symbol.into());
        self
    }

    async fn lookup(&self, symbol: &str) -> Result<&CompanyRecord> {
        if let Some(delay) = self.delays.get(symbol) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(symbol) {
            return Err(AnalysisError::Collaborator(format!(
                "upstream unavailable for {symbol}"
            )));
        }
        self.records
            .get(symbol)
            .ok_or_else(|| AnalysisError::unavailable(symbol, "unknown symbol"))
    }
}

#[async_trait]
impl DataSource for InMemoryDataSource {
    async fn company_record(&self, symbol: &str) -> Result<CompanyRecord> {
        self.lookup(symbol).await.cloned()
    }

    async fn sector_companies(&self, sector: &str) -> Result<Vec<String>> {
        Ok(self
            .records
            .values()
            .filter(|r| r.sector() == Some(sector))
            .map(|r| r.symbol.clone())
            .collect())
    }

    async fn peer_snapshot(&self, symbol: &str) -> Result<PeerSnapshot> {
        self.lookup(symbol).await.map(CompanyRecord::snapshot)
    }

    async fn sector_averages(&self, sector: &str) -> Result<BTreeMap<String, f64>> {
        Ok(self.sector_averages.get(sector).cloned().unwrap_or_default())
    }

    async fn list_companies(&self) -> Result<Vec<String>> {
        Ok(self.records.keys().cloned().collect())
    }
}

/// News search answering from a fixed list per query word
#[derive(Debug, Clone, Default)]
pub struct StaticNewsSearch {
    items: BTreeMap<String, Vec<NewsItem>>,
}

impl StaticNewsSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items returned for any query mentioning `key`
    pub fn with_items(mut self, key: impl Into<String>, items: Vec<NewsItem>) -> Self {
        self.items.entry(key.into()).or_default().extend(items);
        self
    }

    fn matching(&self, text: &str) -> Vec<NewsItem> {
        let upper = text.to_uppercase();
        self.items
            .iter()
            .filter(|(key, _)| upper.contains(&key.to_uppercase()))
            .flat_map(|(_, items)| items.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl NewsSearch for StaticNewsSearch {
    async fn search_news(&self, query: &str, max_results: usize) -> Result<Vec<NewsItem>> {
        let mut items = self.matching(query);
        items.truncate(max_results);
        Ok(items)
    }

    async fn search_company(
        &self,
        company_name: &str,
        symbol: Option<&str>,
    ) -> Result<Vec<NewsItem>> {
        let mut items = self.matching(company_name);
        if items.is_empty() {
            if let Some(symbol) = symbol {
                items = self.matching(symbol);
            }
        }
        Ok(items)
    }
}

/// Document source over a url to text map
#[derive(Debug, Clone, Default)]
pub struct StaticDocuments {
    documents: HashMap<String, String>,
}

impl StaticDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(url.into(), text.into());
        self
    }
}

#[async_trait]
impl DocumentSource for StaticDocuments {
    async fn document_text(&self, url: &str) -> Result<String> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| AnalysisError::Collaborator(format!("document not found: {url}")))
    }
}
