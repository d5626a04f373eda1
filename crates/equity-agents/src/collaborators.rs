//! External collaborators the tools delegate to
//!
//! Storage, upstream fetching and web search live behind these traits. The
//! engine only reads through them.

use crate::error::Result;
use crate::models::{CompanyRecord, NewsItem, PeerSnapshot};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Company data with store-or-fetch semantics
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Full record for a symbol
    ///
    /// Served from the store when present, otherwise fetched upstream. The
    /// record's `freshness` says which.
    async fn company_record(&self, symbol: &str) -> Result<CompanyRecord>;

    /// Symbols listed in a sector
    async fn sector_companies(&self, sector: &str) -> Result<Vec<String>>;

    /// Quick figures for one peer
    async fn peer_snapshot(&self, symbol: &str) -> Result<PeerSnapshot>;

    /// Sector average per metric (`pe_ratio`, `pb_ratio`, `roe`, ...)
    async fn sector_averages(&self, sector: &str) -> Result<BTreeMap<String, f64>>;

    /// All known symbols
    async fn list_companies(&self) -> Result<Vec<String>>;
}

/// Web and news search
#[async_trait]
pub trait NewsSearch: Send + Sync {
    async fn search_news(&self, query: &str, max_results: usize) -> Result<Vec<NewsItem>>;

    /// General information about a company
    async fn search_company(&self, company_name: &str, symbol: Option<&str>)
    -> Result<Vec<NewsItem>>;
}

/// Text of published reports
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn document_text(&self, url: &str) -> Result<String>;
}
