//! Tools of the research specialist

use crate::collaborators::{DocumentSource, NewsSearch};
use agent_core::{Error, Result as AgentResult};
use agent_runtime::OneShot;
use agent_tools::{ParamType, ParameterSchema, Tool, parse_arguments};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use super::{GET_REPORT_TEXT, SEARCH_COMPANY_INFO, SEARCH_NEWS};

const DEFAULT_MAX_RESULTS: usize = 5;

/// Instruction for condensing a long document
pub const SUMMARIZER_PROMPT: &str = "You are a document analyst. Condense the document below \
for an equity research analyst. Keep every figure that matters (revenue, profit, EPS, \
dividends, debt), decisions and announcements, management outlook, and risks. \
Answer with plain text only.";

/// Recent news for a query
pub struct SearchNewsTool {
    search: Arc<dyn NewsSearch>,
}

#[derive(Debug, Deserialize)]
struct NewsParams {
    query: String,
    #[serde(default)]
    max_results: Option<usize>,
}

impl SearchNewsTool {
    pub fn new(search: Arc<dyn NewsSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for SearchNewsTool {
    async fn execute(&self, arguments: Value) -> AgentResult<Value> {
        let params: NewsParams = parse_arguments(SEARCH_NEWS, arguments)?;
        let max_results = params.max_results.unwrap_or(DEFAULT_MAX_RESULTS);

        let results = self
            .search
            .search_news(&params.query, max_results)
            .await
            .map_err(|e| Error::tool(SEARCH_NEWS, e.to_string()))?;

        Ok(json!({
            "query": params.query,
            "count": results.len(),
            "results": results,
        }))
    }

    fn name(&self) -> &str {
        SEARCH_NEWS
    }

    fn description(&self) -> &str {
        "Search for recent news about a company or topic."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required(
                "query",
                ParamType::String,
                "Search query, e.g. \"OGDC stock news\"",
            )
            .optional(
                "max_results",
                ParamType::Integer,
                "Maximum number of results (default 5)",
            )
    }
}

/// General information about a company
pub struct SearchCompanyInfoTool {
    search: Arc<dyn NewsSearch>,
}

#[derive(Debug, Deserialize)]
struct CompanyInfoParams {
    company_name: String,
    #[serde(default)]
    symbol: Option<String>,
}

impl SearchCompanyInfoTool {
    pub fn new(search: Arc<dyn NewsSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for SearchCompanyInfoTool {
    async fn execute(&self, arguments: Value) -> AgentResult<Value> {
        let params: CompanyInfoParams = parse_arguments(SEARCH_COMPANY_INFO, arguments)?;
        let results = self
            .search
            .search_company(&params.company_name, params.symbol.as_deref())
            .await
            .map_err(|e| Error::tool(SEARCH_COMPANY_INFO, e.to_string()))?;

        let query = match &params.symbol {
            Some(symbol) => format!("{} {symbol}", params.company_name),
            None => params.company_name.clone(),
        };
        Ok(json!({
            "query": query,
            "count": results.len(),
            "results": results,
        }))
    }

    fn name(&self) -> &str {
        SEARCH_COMPANY_INFO
    }

    fn description(&self) -> &str {
        "Search for general information about a company: business lines, management, \
         strategy and recent developments."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("company_name", ParamType::String, "Company name")
            .optional("symbol", ParamType::String, "Ticker symbol")
    }
}

/// Text of a published report, condensed when it is too long
pub struct GetReportTextTool {
    documents: Arc<dyn DocumentSource>,
    summarizer: Option<Arc<OneShot>>,
    default_max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct ReportParams {
    url: String,
    #[serde(default)]
    max_chars: Option<usize>,
}

impl GetReportTextTool {
    pub fn new(documents: Arc<dyn DocumentSource>, default_max_chars: usize) -> Self {
        Self {
            documents,
            summarizer: None,
            default_max_chars,
        }
    }

    /// Condense long documents with a separate reasoning call
    pub fn with_summarizer(mut self, summarizer: Arc<OneShot>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    async fn condense(&self, url: &str, text: &str, max_chars: usize) -> Option<String> {
        let summarizer = self.summarizer.as_ref()?;
        let prompt = format!("{SUMMARIZER_PROMPT}\n\nDocument ({url}):\n{text}");
        match summarizer.ask(prompt).await {
            Ok((summary, usage)) => {
                info!(
                    url = %url,
                    original_chars = text.chars().count(),
                    summary_chars = summary.chars().count(),
                    tokens = usage.total(),
                    "Report summarized"
                );
                Some(truncate_chars(&summary, max_chars))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Summarizer failed, truncating raw text");
                None
            }
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl Tool for GetReportTextTool {
    async fn execute(&self, arguments: Value) -> AgentResult<Value> {
        let params: ReportParams = parse_arguments(GET_REPORT_TEXT, arguments)?;
        let max_chars = params.max_chars.unwrap_or(self.default_max_chars);
        if max_chars == 0 {
            return Err(Error::invalid_arguments(
                GET_REPORT_TEXT,
                "max_chars must be greater than 0",
            ));
        }

        let text = self
            .documents
            .document_text(&params.url)
            .await
            .map_err(|e| Error::tool(GET_REPORT_TEXT, e.to_string()))?;
        let original_chars = text.chars().count();

        let (text, summarized) = if original_chars <= max_chars {
            (text, false)
        } else if let Some(summary) = self.condense(&params.url, &text, max_chars).await {
            (summary, true)
        } else {
            (truncate_chars(&text, max_chars), false)
        };

        Ok(json!({
            "url": params.url,
            "char_count": text.chars().count(),
            "original_char_count": original_chars,
            "truncated": original_chars > max_chars && !summarized,
            "summarized": summarized,
            "text": text,
        }))
    }

    fn name(&self) -> &str {
        GET_REPORT_TEXT
    }

    fn description(&self) -> &str {
        "Get the text of a financial report or announcement by URL. Long documents are \
         condensed to at most max_chars characters."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("url", ParamType::String, "Document URL")
            .optional(
                "max_chars",
                ParamType::Integer,
                "Maximum characters to return (default 50000)",
            )
    }
}
