//! Tool catalog for the equity specialists

pub mod data;
pub mod research;
pub mod valuation;

pub use data::{GetCompanyDataTool, GetSectorPeersTool, ListCompaniesTool};
pub use research::{GetReportTextTool, SearchCompanyInfoTool, SearchNewsTool};
pub use valuation::CalculatorTool;

use crate::collaborators::{DataSource, DocumentSource, NewsSearch};
use agent_runtime::OneShot;
use agent_tools::{Tool, ToolRegistry};
use std::sync::Arc;

pub const GET_COMPANY_DATA: &str = "get_company_data";
pub const GET_SECTOR_PEERS: &str = "get_sector_peers";
pub const LIST_COMPANIES: &str = "list_companies";

pub const SEARCH_NEWS: &str = "search_news";
pub const SEARCH_COMPANY_INFO: &str = "search_company_info";
pub const GET_REPORT_TEXT: &str = "get_report_text";

pub const CALCULATE_PE_VALUATION: &str = "calculate_pe_valuation";
pub const CALCULATE_GRAHAM_NUMBER: &str = "calculate_graham_number";
pub const CALCULATE_DCF: &str = "calculate_dcf";
pub const CALCULATE_MARGIN_OF_SAFETY: &str = "calculate_margin_of_safety";
pub const ANALYZE_FINANCIAL_HEALTH: &str = "analyze_financial_health";
pub const COMPARE_WITH_SECTOR: &str = "compare_with_sector";

/// Collaborators and limits the catalog is built from
pub struct Catalog {
    pub data_source: Arc<dyn DataSource>,
    pub news: Arc<dyn NewsSearch>,
    pub documents: Arc<dyn DocumentSource>,
    pub summarizer: Option<Arc<OneShot>>,
    pub max_peers: usize,
    pub summary_max_chars: usize,
}

impl Catalog {
    /// Every tool, in registration order
    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut report_text =
            GetReportTextTool::new(Arc::clone(&self.documents), self.summary_max_chars);
        if let Some(summarizer) = &self.summarizer {
            report_text = report_text.with_summarizer(Arc::clone(summarizer));
        }

        vec![
            Arc::new(GetCompanyDataTool::new(Arc::clone(&self.data_source))),
            Arc::new(GetSectorPeersTool::new(
                Arc::clone(&self.data_source),
                self.max_peers,
            )),
            Arc::new(ListCompaniesTool::new(Arc::clone(&self.data_source))),
            Arc::new(SearchNewsTool::new(Arc::clone(&self.news))),
            Arc::new(SearchCompanyInfoTool::new(Arc::clone(&self.news))),
            Arc::new(report_text),
            Arc::new(valuation::pe_valuation_tool()),
            Arc::new(valuation::graham_number_tool()),
            Arc::new(valuation::dcf_tool()),
            Arc::new(valuation::margin_of_safety_tool()),
            Arc::new(valuation::financial_health_tool()),
            Arc::new(valuation::compare_with_sector_tool()),
        ]
    }

    /// Registry holding the whole catalog
    pub fn registry(&self) -> agent_core::Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for tool in self.tools() {
            registry.register(tool)?;
        }
        Ok(registry)
    }
}
