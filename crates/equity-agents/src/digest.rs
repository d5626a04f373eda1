//! Versioned textual digests passed between specialists
//!
//! A digest is a pure function of typed output. Data feeds research, data and
//! research feed the analyst, and the whole analysis state feeds synthesis.
//! Every context handed to a specialist starts with a version header so
//! prompts can change format without silently confusing older scripts.

use crate::output::{AnalystOutput, DataOutput, ResearchOutput};
use crate::state::AnalysisState;
use std::fmt::Write;

/// Bump when the layout of any digest changes
pub const DIGEST_VERSION: u32 = 1;

fn header() -> String {
    format!("[digest v{DIGEST_VERSION}]")
}

fn num(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:+.2}%"))
}

/// Market data, fundamentals and peers for one symbol
pub fn data_digest(data: &DataOutput) -> String {
    let mut out = format!("=== Data for {} ===\n", data.symbol);

    if let Some(quote) = &data.quote {
        let _ = writeln!(out, "Price: {}", num(quote.price));
        let _ = writeln!(
            out,
            "Change: {} ({})",
            num(quote.change),
            pct(quote.change_pct)
        );
        let _ = writeln!(out, "P/E: {}", num(quote.pe_ratio));
        if quote.eps.is_some() {
            let _ = writeln!(out, "EPS: {}", num(quote.eps));
        }
        let _ = writeln!(
            out,
            "52-week range: {} - {}",
            num(quote.week_52_low),
            num(quote.week_52_high)
        );
    }

    if let Some(company) = &data.company {
        let _ = writeln!(
            out,
            "Company: {} | Sector: {}",
            company.name.as_deref().unwrap_or("N/A"),
            data.sector
                .as_deref()
                .or(company.sector.as_deref())
                .unwrap_or("N/A")
        );
    }

    if !data.financials.is_empty() {
        out.push_str("\nFinancials:\n");
        for row in data.financials.iter().take(16) {
            let _ = writeln!(out, "  {} {}: {}", row.period, row.metric, num(row.value));
        }
    }

    if !data.ratios.is_empty() {
        out.push_str("\nRatios:\n");
        for row in data.ratios.iter().take(12) {
            let _ = writeln!(out, "  {} {}: {}", row.period, row.metric, num(row.value));
        }
    }

    if !data.reports.is_empty() {
        out.push_str("\nReports:\n");
        for report in data.reports.iter().take(6) {
            let _ = writeln!(
                out,
                "  [{}] {}: {}",
                report.report_type.to_uppercase(),
                report.period,
                report.url
            );
        }
    }

    if !data.announcements.is_empty() {
        out.push_str("\nAnnouncements:\n");
        for item in data.announcements.iter().take(15) {
            let _ = writeln!(out, "  {}: {}", item.date, item.title);
        }
    }

    if !data.peers.is_empty() {
        let _ = writeln!(out, "\nPeers: {}", data.peers.join(", "));
    }
    if !data.peer_data.is_empty() {
        out.push_str("Peer comparison:\n");
        for peer in &data.peer_data {
            let _ = writeln!(
                out,
                "  {}: price {}, P/E {}, EPS {}, market cap {}",
                peer.symbol,
                num(peer.price),
                num(peer.pe_ratio),
                num(peer.eps),
                num(peer.market_cap)
            );
        }
    }

    if !data.sector_averages.is_empty() {
        out.push_str("Sector Averages:\n");
        for (metric, value) in &data.sector_averages {
            let _ = writeln!(out, "  {metric}: {value:.2}");
        }
    }

    if !data.data_gaps.is_empty() {
        let _ = writeln!(out, "\nData Gaps: {}", data.data_gaps.join(", "));
    }
    out
}

/// Sentiment, news and findings for one symbol
pub fn research_digest(research: &ResearchOutput) -> String {
    let mut out = format!("=== Research for {} ===\n", research.symbol);
    let _ = writeln!(
        out,
        "Sentiment: {} ({:+.2})",
        research.sentiment.as_str(),
        research.sentiment_score
    );

    if !research.news_items.is_empty() {
        out.push_str("Top news:\n");
        for item in research.news_items.iter().take(3) {
            match &item.date {
                Some(date) => {
                    let _ = writeln!(out, "  - {} ({date})", item.title);
                }
                None => {
                    let _ = writeln!(out, "  - {}", item.title);
                }
            }
        }
    }

    for (title, items) in [
        ("Key events", &research.key_events),
        ("Report highlights", &research.report_highlights),
        ("Risks", &research.risks_identified),
        ("Opportunities", &research.opportunities),
    ] {
        if !items.is_empty() {
            let _ = writeln!(out, "{title}:");
            for item in items {
                let _ = writeln!(out, "  - {item}");
            }
        }
    }
    out
}

/// Valuation and recommendation for one symbol
pub fn analyst_digest(analysis: &AnalystOutput) -> String {
    let mut out = format!("=== Analysis for {} ===\n", analysis.symbol);
    let _ = writeln!(out, "Health Score: {}/100", analysis.health_score);
    let _ = writeln!(
        out,
        "Recommendation: {} (Confidence: {:.0}%)",
        analysis.recommendation,
        analysis.confidence * 100.0
    );
    let _ = writeln!(
        out,
        "Fair value: {} | Price: {} | Margin of safety: {}",
        num(analysis.fair_value),
        num(analysis.current_price),
        pct(analysis.margin_of_safety)
    );

    if !analysis.valuations.is_empty() {
        out.push_str("Valuations:\n");
        for valuation in &analysis.valuations {
            let _ = writeln!(out, "  {}: {:.2}", valuation.method, valuation.value);
        }
    }
    if !analysis.strengths.is_empty() {
        let _ = writeln!(out, "Strengths: {}", analysis.strengths.join("; "));
    }
    if !analysis.red_flags.is_empty() {
        let _ = writeln!(out, "Red flags: {}", analysis.red_flags.join("; "));
    }
    out
}

/// Context handed to the research specialist
pub fn research_context(data: &DataOutput) -> String {
    format!("{}\n{}", header(), data_digest(data))
}

/// Context handed to the analyst specialist
pub fn analyst_context(data: &DataOutput, research: Option<&ResearchOutput>) -> String {
    let mut out = research_context(data);
    match research {
        Some(research) => {
            out.push('\n');
            out.push_str(&research_digest(research));
        }
        None => out.push_str("\nResearch: unavailable\n"),
    }
    out
}

/// Everything known about a request, for synthesis
pub fn state_digest(state: &AnalysisState) -> String {
    let mut out = format!(
        "{}\nQuery: {}\nSymbols: {}\n",
        header(),
        state.query,
        state.requested.join(", ")
    );

    for symbol in &state.requested {
        let Some(slot) = state.slots.get(symbol) else {
            continue;
        };
        out.push('\n');
        if let Some(data) = &slot.data {
            out.push_str(&data_digest(data));
        }
        if let Some(research) = &slot.research {
            out.push_str(&research_digest(research));
        }
        if let Some(analysis) = &slot.analysis {
            out.push_str(&analyst_digest(analysis));
        }
        if !slot.data_gaps.is_empty() {
            let _ = writeln!(out, "Gaps for {symbol}: {}", slot.data_gaps.join("; "));
        }
    }

    if !state.errors.is_empty() {
        let _ = writeln!(out, "\nErrors: {}", state.errors.join("; "));
    }
    out
}
