//! Data specialist

use crate::models::{CompanyRecord, PeerSnapshot};
use crate::output::DataOutput;
use crate::tools::{GET_COMPANY_DATA, GET_SECTOR_PEERS, LIST_COMPANIES};
use agent_core::Result;
use agent_runtime::{AgentTask, ExtractionStrategy, Extractor, ObservationMap};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

pub const NAME: &str = "data";

pub const TOOLS: &[&str] = &[GET_COMPANY_DATA, GET_SECTOR_PEERS, LIST_COMPANIES];

pub const SYSTEM_PROMPT: &str = "You are a data agent retrieving market data for listed companies.

Workflow (two tool calls are normally enough, make them in one batch):
1. get_company_data(symbol): quote, profile, financials, ratios, reports and announcements.
   Fetches upstream automatically when the company is not stored yet.
2. get_sector_peers(symbol): peers, peer snapshots and sector averages in one call.

Call list_companies only when the symbol looks wrong and you need the known symbols.
When both calls have returned, reply with a one-line confirmation. The collected tool
results are the output; do not restate them.";

/// Task for one symbol
pub fn task(symbol: &str) -> AgentTask {
    AgentTask::new(
        symbol,
        format!("Collect data for {symbol}. Get the company record and its sector peers."),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PeersPayload {
    sector: Option<String>,
    peers: Vec<String>,
    peer_data: Vec<PeerSnapshot>,
    sector_averages: BTreeMap<String, f64>,
}

/// Builds [`DataOutput`] from tool observations
///
/// Never fails: anything missing or malformed becomes a data gap, so a run
/// cut short still yields whatever it fetched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataExtractor;

impl DataExtractor {
    fn gaps(output: &DataOutput) -> Vec<String> {
        let checks = [
            ("quote", output.quote.is_none()),
            ("company_profile", output.company.is_none()),
            ("financials", output.financials.is_empty()),
            ("ratios", output.ratios.is_empty()),
            ("reports", output.reports.is_empty()),
            ("announcements", output.announcements.is_empty()),
            ("peers", output.peers.is_empty()),
            ("sector_averages", output.sector_averages.is_empty()),
        ];
        checks
            .into_iter()
            .filter(|(_, missing)| *missing)
            .map(|(gap, _)| gap.to_string())
            .collect()
    }
}

impl Extractor for DataExtractor {
    type Output = DataOutput;

    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Deterministic
    }

    fn project(&self, subject: &str, observations: &ObservationMap) -> Result<DataOutput> {
        let mut output = DataOutput::new(subject);
        let mut malformed = Vec::new();

        if let Some(payload) = super::payload(observations, GET_COMPANY_DATA) {
            match CompanyRecord::deserialize(payload) {
                Ok(record) => {
                    output.sector = record.sector().map(str::to_string);
                    output.quote = record.quote;
                    output.company = record.company;
                    output.financials = record.financials;
                    output.ratios = record.ratios;
                    output.reports = record.reports;
                    output.announcements = record.announcements;
                    output.freshness = record.freshness;
                }
                Err(e) => malformed.push(format!("{GET_COMPANY_DATA}: malformed payload: {e}")),
            }
        }

        if let Some(payload) = super::payload(observations, GET_SECTOR_PEERS) {
            match PeersPayload::deserialize(payload) {
                Ok(peers) => {
                    if peers.sector.is_some() {
                        output.sector = peers.sector;
                    }
                    output.peers = peers.peers;
                    output.peer_data = peers.peer_data;
                    output.sector_averages = peers.sector_averages;
                }
                Err(e) => malformed.push(format!("{GET_SECTOR_PEERS}: malformed payload: {e}")),
            }
        }

        let mut gaps = Self::gaps(&output);
        gaps.extend(malformed);
        gaps.extend(observations.values().filter_map(|observation| {
            observation
                .failure_info()
                .map(|failure| format!("{}: {}", observation.tool_name, failure.message))
        }));
        output.data_gaps = gaps;

        debug!(
            symbol = %subject,
            gaps = output.data_gaps.len(),
            has_core_data = output.has_core_data(),
            "Data projected"
        );
        Ok(output)
    }
}
