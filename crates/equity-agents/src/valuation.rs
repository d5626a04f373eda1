//! Valuation and financial health calculations
//!
//! Pure functions. The analyst tools wrap them and the extractor reuses them
//! when the model leaves a figure out.

use crate::models::Valuation;
use serde::{Deserialize, Serialize};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fair value from earnings and a target multiple
pub fn pe_valuation(eps: f64, sector_pe: f64) -> Valuation {
    if eps <= 0.0 {
        return Valuation {
            method: "P/E Valuation".to_string(),
            value: 0.0,
            notes: Some("EPS is negative or zero, P/E valuation not applicable".to_string()),
        };
    }
    Valuation {
        method: "P/E Valuation".to_string(),
        value: round2(eps * sector_pe),
        notes: Some(format!("Fair Value = EPS ({eps}) x P/E ({sector_pe})")),
    }
}

/// Graham number, `sqrt(22.5 * eps * bvps)`
pub fn graham_number(eps: f64, book_value_per_share: f64) -> Valuation {
    if eps <= 0.0 || book_value_per_share <= 0.0 {
        return Valuation {
            method: "Graham Number".to_string(),
            value: 0.0,
            notes: Some("EPS or book value is negative or zero, formula not applicable".to_string()),
        };
    }
    Valuation {
        method: "Graham Number".to_string(),
        value: round2((22.5 * eps * book_value_per_share).sqrt()),
        notes: Some(format!("sqrt(22.5 x {eps} x {book_value_per_share})")),
    }
}

/// Discounted cash flow with a Gordon growth terminal value
///
/// Per share when `shares_outstanding` is positive, enterprise value otherwise.
/// Empty projections or a growth rate at or above the discount rate give zero.
pub fn dcf(
    free_cash_flows: &[f64],
    discount_rate: f64,
    terminal_growth_rate: f64,
    shares_outstanding: Option<f64>,
) -> Valuation {
    let zero = |notes: &str| Valuation {
        method: "DCF".to_string(),
        value: 0.0,
        notes: Some(notes.to_string()),
    };
    let Some(&last) = free_cash_flows.last() else {
        return zero("No cash flow projections provided");
    };
    if terminal_growth_rate >= discount_rate {
        return zero("Terminal growth rate must be less than discount rate");
    }

    let mut discount = 1.0;
    let mut present_value = 0.0;
    for fcf in free_cash_flows {
        discount *= 1.0 + discount_rate;
        present_value += fcf / discount;
    }
    let terminal = last * (1.0 + terminal_growth_rate) / (discount_rate - terminal_growth_rate);
    let enterprise_value = present_value + terminal / discount;

    match shares_outstanding {
        Some(shares) if shares > 0.0 => Valuation {
            method: "DCF".to_string(),
            value: round2(enterprise_value / shares),
            notes: Some(format!("Per share value (enterprise: {enterprise_value:.0})")),
        },
        _ => Valuation {
            method: "DCF".to_string(),
            value: round2(enterprise_value),
            notes: Some("Enterprise value (shares not provided)".to_string()),
        },
    }
}

/// Margin of safety in percent of the current price
///
/// `None` when either input is not positive.
pub fn margin_of_safety(fair_value: f64, current_price: f64) -> Option<f64> {
    if fair_value <= 0.0 || current_price <= 0.0 {
        return None;
    }
    Some(round2((fair_value - current_price) / current_price * 100.0))
}

/// Ratios feeding the health assessment, all optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthInputs {
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub interest_coverage: Option<f64>,
    /// Percent
    pub profit_margin: Option<f64>,
    /// Percent
    pub roe: Option<f64>,
    /// Percent
    pub revenue_growth: Option<f64>,
    /// Percent
    pub earnings_growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub red_flags: Vec<String>,
    pub strengths: Vec<String>,
    pub health_score: u8,
}

pub fn red_flags(inputs: &HealthInputs) -> Vec<String> {
    let mut flags = Vec::new();
    if let Some(v) = inputs.current_ratio.filter(|v| *v < 1.0) {
        flags.push(format!("Low current ratio ({v}) - potential liquidity issues"));
    }
    if let Some(v) = inputs.quick_ratio.filter(|v| *v < 0.5) {
        flags.push(format!("Very low quick ratio ({v}) - immediate liquidity risk"));
    }
    if let Some(v) = inputs.debt_to_equity.filter(|v| *v > 2.0) {
        flags.push(format!("High debt-to-equity ({v}) - high financial leverage"));
    }
    if let Some(v) = inputs.interest_coverage.filter(|v| *v < 2.0) {
        flags.push(format!("Low interest coverage ({v}) - may struggle with debt payments"));
    }
    if let Some(v) = inputs.profit_margin.filter(|v| *v < 0.0) {
        flags.push(format!("Negative profit margin ({v}%) - company is losing money"));
    }
    if let Some(v) = inputs.roe.filter(|v| *v < 5.0) {
        flags.push(format!("Low ROE ({v}%) - poor return on shareholder equity"));
    }
    if let Some(v) = inputs.revenue_growth.filter(|v| *v < -10.0) {
        flags.push(format!("Declining revenue ({v}%) - shrinking business"));
    }
    if let Some(v) = inputs.earnings_growth.filter(|v| *v < -20.0) {
        flags.push(format!("Declining earnings ({v}%) - profitability deteriorating"));
    }
    flags
}

pub fn strengths(inputs: &HealthInputs) -> Vec<String> {
    let mut found = Vec::new();
    if let Some(v) = inputs.current_ratio.filter(|v| *v > 2.0) {
        found.push(format!("Strong current ratio ({v}) - good liquidity position"));
    }
    if let Some(v) = inputs.debt_to_equity.filter(|v| *v < 0.5) {
        found.push(format!("Low debt-to-equity ({v}) - conservative capital structure"));
    }
    if let Some(v) = inputs.interest_coverage.filter(|v| *v > 10.0) {
        found.push(format!("Excellent interest coverage ({v}) - easily services debt"));
    }
    if let Some(v) = inputs.profit_margin.filter(|v| *v > 15.0) {
        found.push(format!("High profit margin ({v}%) - strong profitability"));
    }
    if let Some(v) = inputs.roe.filter(|v| *v > 15.0) {
        found.push(format!("High ROE ({v}%) - efficient use of equity"));
    }
    if let Some(v) = inputs.revenue_growth.filter(|v| *v > 15.0) {
        found.push(format!("Strong revenue growth ({v}%) - expanding business"));
    }
    found
}

/// Red flags, strengths and a 0 to 100 score
///
/// The score starts at 50 and moves ten points per strength or flag.
pub fn assess_health(inputs: &HealthInputs) -> HealthAssessment {
    let red_flags = red_flags(inputs);
    let strengths = strengths(inputs);
    let score = 50 + 10 * strengths.len() as i64 - 10 * red_flags.len() as i64;
    HealthAssessment {
        red_flags,
        strengths,
        health_score: score.clamp(0, 100) as u8,
    }
}

/// Company metric against its sector average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultipleVsSector {
    pub company: f64,
    pub sector: f64,
    /// Positive when the company trades below the sector
    pub discount_pct: f64,
    pub is_undervalued: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnVsSector {
    pub company: f64,
    pub sector: f64,
    pub outperforms: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorComparison {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_vs_sector: Option<MultipleVsSector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pb_vs_sector: Option<MultipleVsSector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roe_vs_sector: Option<ReturnVsSector>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorInputs {
    pub company_pe: Option<f64>,
    pub sector_pe: Option<f64>,
    pub company_pb: Option<f64>,
    pub sector_pb: Option<f64>,
    pub company_roe: Option<f64>,
    pub sector_roe: Option<f64>,
}

fn multiple_vs_sector(company: Option<f64>, sector: Option<f64>) -> Option<MultipleVsSector> {
    let (company, sector) = (company?, sector.filter(|s| *s > 0.0)?);
    Some(MultipleVsSector {
        company,
        sector,
        discount_pct: round2((sector - company) / sector * 100.0),
        is_undervalued: company < sector,
    })
}

/// Premium or discount on each metric both sides report
pub fn compare_with_sector(inputs: &SectorInputs) -> SectorComparison {
    SectorComparison {
        pe_vs_sector: multiple_vs_sector(inputs.company_pe, inputs.sector_pe),
        pb_vs_sector: multiple_vs_sector(inputs.company_pb, inputs.sector_pb),
        roe_vs_sector: inputs
            .company_roe
            .zip(inputs.sector_roe)
            .map(|(company, sector)| ReturnVsSector {
                company,
                sector,
                outperforms: company > sector,
            }),
    }
}
