//! Tools of the data specialist

use crate::collaborators::DataSource;
use agent_core::{Error, Result as AgentResult};
use agent_tools::{ParamType, ParameterSchema, Tool, parse_arguments};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{GET_COMPANY_DATA, GET_SECTOR_PEERS, LIST_COMPANIES};

/// Full company record, fetched upstream when the store has none
pub struct GetCompanyDataTool {
    source: Arc<dyn DataSource>,
}

#[derive(Debug, Deserialize)]
struct SymbolParams {
    symbol: String,
}

impl GetCompanyDataTool {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for GetCompanyDataTool {
    async fn execute(&self, arguments: Value) -> AgentResult<Value> {
        let params: SymbolParams = parse_arguments(GET_COMPANY_DATA, arguments)?;
        let symbol = params.symbol.trim().to_uppercase();

        let record = self
            .source
            .company_record(&symbol)
            .await
            .map_err(|e| Error::tool(GET_COMPANY_DATA, e.to_string()))?;
        debug!(symbol = %symbol, freshness = ?record.freshness, "Company record loaded");

        let sector = record.sector().map(str::to_string);
        let mut payload = serde_json::to_value(&record)
            .map_err(|e| Error::tool(GET_COMPANY_DATA, e.to_string()))?;
        if let (Some(sector), Some(map)) = (sector, payload.as_object_mut()) {
            map.insert("sector".to_string(), json!(sector));
        }
        Ok(payload)
    }

    fn name(&self) -> &str {
        GET_COMPANY_DATA
    }

    fn description(&self) -> &str {
        "Get the full record for a listed company: quote, profile, financials, ratios, \
         reports and announcements. Fetches upstream automatically when the record is \
         not stored yet; data_freshness tells which."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required("symbol", ParamType::String, "Ticker symbol, e.g. OGDC")
    }
}

/// Sector peers with their snapshots and the sector averages
pub struct GetSectorPeersTool {
    source: Arc<dyn DataSource>,
    default_max_peers: usize,
}

#[derive(Debug, Deserialize)]
struct PeersParams {
    symbol: String,
    #[serde(default)]
    max_peers: Option<usize>,
}

impl GetSectorPeersTool {
    pub fn new(source: Arc<dyn DataSource>, default_max_peers: usize) -> Self {
        Self {
            source,
            default_max_peers,
        }
    }
}

#[async_trait]
impl Tool for GetSectorPeersTool {
    async fn execute(&self, arguments: Value) -> AgentResult<Value> {
        let params: PeersParams = parse_arguments(GET_SECTOR_PEERS, arguments)?;
        let symbol = params.symbol.trim().to_uppercase();
        let max_peers = params.max_peers.unwrap_or(self.default_max_peers);
        let failed = |e: crate::AnalysisError| Error::tool(GET_SECTOR_PEERS, e.to_string());

        let record = self.source.company_record(&symbol).await.map_err(failed)?;
        let Some(sector) = record.sector().map(str::to_string) else {
            return Ok(json!({
                "symbol": symbol,
                "sector": null,
                "peers": [],
                "peer_count": 0,
                "source": null,
                "peer_data": [],
                "sector_averages": {},
                "note": "Sector unknown, no peers available",
            }));
        };

        let peers: Vec<String> = self
            .source
            .sector_companies(&sector)
            .await
            .map_err(failed)?
            .into_iter()
            .filter(|p| *p != symbol)
            .take(max_peers)
            .collect();

        let snapshots = join_all(peers.iter().map(|p| self.source.peer_snapshot(p))).await;
        let mut peer_data = Vec::with_capacity(snapshots.len());
        for (peer, snapshot) in peers.iter().zip(snapshots) {
            match snapshot {
                Ok(snapshot) => peer_data.push(snapshot),
                Err(e) => warn!(symbol = %symbol, peer = %peer, error = %e, "Skipping peer"),
            }
        }

        let sector_averages = self.source.sector_averages(&sector).await.map_err(failed)?;
        info!(
            symbol = %symbol,
            sector = %sector,
            peers = peers.len(),
            fetched = peer_data.len(),
            "Sector peers collected"
        );

        Ok(json!({
            "symbol": symbol,
            "sector": sector,
            "peer_count": peers.len(),
            "source": if peers.is_empty() { Value::Null } else { json!("store") },
            "peers": peers,
            "peer_data": peer_data,
            "sector_averages": sector_averages,
        }))
    }

    fn name(&self) -> &str {
        GET_SECTOR_PEERS
    }

    fn description(&self) -> &str {
        "Get companies in the same sector, a snapshot of each (price, P/E, market cap, EPS, \
         profit margin) and the sector average metrics, in one call."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("symbol", ParamType::String, "Ticker symbol")
            .optional(
                "max_peers",
                ParamType::Integer,
                "Maximum number of peers to return (default 5)",
            )
    }
}

/// Every symbol the data source knows
pub struct ListCompaniesTool {
    source: Arc<dyn DataSource>,
}

impl ListCompaniesTool {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for ListCompaniesTool {
    async fn execute(&self, _arguments: Value) -> AgentResult<Value> {
        let symbols = self
            .source
            .list_companies()
            .await
            .map_err(|e| Error::tool(LIST_COMPANIES, e.to_string()))?;
        Ok(json!({ "count": symbols.len(), "symbols": symbols }))
    }

    fn name(&self) -> &str {
        LIST_COMPANIES
    }

    fn description(&self) -> &str {
        "List all companies available in the data store."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
    }
}
