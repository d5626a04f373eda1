//! Research specialist

use crate::models::{NewsItem, SentimentLabel};
use crate::output::ResearchOutput;
use crate::parser::{extract_json, number, string_list};
use crate::tools::{GET_REPORT_TEXT, SEARCH_COMPANY_INFO, SEARCH_NEWS};
use agent_core::{Error, Result};
use agent_runtime::{AgentTask, ExtractionStrategy, Extractor, ObservationMap};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const NAME: &str = "research";

pub const TOOLS: &[&str] = &[SEARCH_NEWS, SEARCH_COMPANY_INFO, GET_REPORT_TEXT];

pub const SYSTEM_PROMPT: &str = r#"You are a research agent covering listed companies.

Responsibilities:
1. Search for recent, material news (earnings, dividends, acquisitions, management changes)
2. Read the latest quarterly and annual reports when their URLs are given in the context
3. Identify risks and opportunities, and judge overall news sentiment

Plan tool calls up front. In the first batch call search_news, search_company_info and
get_report_text for the latest quarterly and annual reports. Use further calls only to
fill gaps.

When done, answer with JSON only:
{
    "symbol": "...",
    "news_items": [{"title": "...", "url": "...", "source": "...", "date": "...", "summary": "...", "sentiment": 0.0}],
    "sentiment_score": 0.0,
    "sentiment": "positive|neutral|negative",
    "key_events": ["..."],
    "report_highlights": ["Revenue: ...", "Profit: ...", "EPS: ..."],
    "risks_identified": ["..."],
    "opportunities": ["..."]
}
sentiment_score ranges from -1 (very negative) to 1 (very positive)."#;

/// Task for one symbol, carrying the data digest as context
pub fn task(symbol: &str, context: &str) -> AgentTask {
    AgentTask::new(
        symbol,
        format!("Research {symbol}: recent news, sentiment, report highlights, risks and opportunities."),
    )
    .with_context(context)
}

fn news_items(value: Option<&Value>) -> Vec<NewsItem> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| NewsItem::deserialize(item).ok())
                .filter(|item| !item.title.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Parses the research answer into [`ResearchOutput`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ResearchExtractor;

impl Extractor for ResearchExtractor {
    type Output = ResearchOutput;

    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Generative
    }

    fn parse(
        &self,
        subject: &str,
        answer: &str,
        observations: &ObservationMap,
    ) -> Result<ResearchOutput> {
        let value = extract_json(answer)?;

        let sentiment_score = number(&value, "sentiment_score").unwrap_or(0.0);
        if !(-1.0..=1.0).contains(&sentiment_score) {
            return Err(Error::OutputParse(format!(
                "sentiment_score {sentiment_score} for {subject} is outside [-1, 1]"
            )));
        }
        let sentiment = value
            .get("sentiment")
            .and_then(Value::as_str)
            .and_then(SentimentLabel::parse)
            .unwrap_or_else(|| SentimentLabel::from_score(sentiment_score));

        let mut news = news_items(value.get("news_items"));
        if news.is_empty() {
            news = news_items(super::payload(observations, SEARCH_NEWS).and_then(|p| p.get("results")));
            debug!(symbol = %subject, items = news.len(), "News taken from search results");
        }

        Ok(ResearchOutput {
            symbol: subject.to_string(),
            news_items: news,
            sentiment_score,
            sentiment,
            key_events: string_list(&value, "key_events"),
            report_highlights: string_list(&value, "report_highlights"),
            risks_identified: string_list(&value, "risks_identified"),
            opportunities: string_list(&value, "opportunities"),
        })
    }
}
