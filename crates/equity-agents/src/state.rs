//! Request-level analysis state

use crate::output::{AnalystOutput, DataOutput, ResearchOutput};
use crate::router::RequestKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What one symbol's pipeline produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolSlot {
    pub data: Option<DataOutput>,
    pub research: Option<ResearchOutput>,
    pub analysis: Option<AnalystOutput>,
    /// Missing data and failed stages, in the order they were found
    pub data_gaps: Vec<String>,
}

impl SymbolSlot {
    /// The data stage yielded a quote or company profile
    ///
    /// That is the minimum for a symbol to appear in a report. Financials or
    /// ratios alone leave nothing to price or name, so such a slot stays in
    /// the state with its gaps but is not reported as resolved.
    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(DataOutput::has_core_data)
    }

    pub fn add_gap(&mut self, gap: impl Into<String>) {
        self.data_gaps.push(gap.into());
    }
}

/// Everything gathered while answering one request
///
/// Each slot is written by exactly one symbol pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub query: String,
    pub kind: RequestKind,
    /// Symbols in the order they were requested
    pub requested: Vec<String>,
    pub slots: BTreeMap<String, SymbolSlot>,
    /// Request-level problems
    pub errors: Vec<String>,
}

impl AnalysisState {
    pub fn new(query: impl Into<String>, kind: RequestKind, requested: Vec<String>) -> Self {
        Self {
            query: query.into(),
            kind,
            requested,
            slots: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn slot(&self, symbol: &str) -> Option<&SymbolSlot> {
        self.slots.get(symbol)
    }

    /// Requested symbols whose slot has data, in request order
    pub fn resolved_symbols(&self) -> Vec<String> {
        self.requested
            .iter()
            .filter(|s| self.slots.get(*s).is_some_and(SymbolSlot::has_data))
            .cloned()
            .collect()
    }

    /// Analyses in request order
    pub fn analyses(&self) -> impl Iterator<Item = &AnalystOutput> {
        self.requested
            .iter()
            .filter_map(|s| self.slots.get(s)?.analysis.as_ref())
    }

    /// Every gap as `SYMBOL: gap`, in request order
    pub fn all_gaps(&self) -> Vec<String> {
        self.requested
            .iter()
            .filter_map(|s| self.slots.get(s).map(|slot| (s, slot)))
            .flat_map(|(symbol, slot)| slot.data_gaps.iter().map(move |g| format!("{symbol}: {g}")))
            .collect()
    }
}
