//! Calculator tools of the analyst specialist
//!
//! Each tool is a thin, synchronous wrapper over a function in
//! [`crate::valuation`]. They share one `Tool` implementation that holds the
//! name, the schema and the compute function.

use crate::models::Recommendation;
use crate::valuation::{self, HealthInputs, SectorInputs};
use agent_core::{Error, Result as AgentResult};
use agent_tools::{ParamType, ParameterSchema, Tool, parse_arguments};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{
    ANALYZE_FINANCIAL_HEALTH, CALCULATE_DCF, CALCULATE_GRAHAM_NUMBER,
    CALCULATE_MARGIN_OF_SAFETY, CALCULATE_PE_VALUATION, COMPARE_WITH_SECTOR,
};

/// A pure calculation exposed as a tool
pub struct CalculatorTool {
    name: &'static str,
    description: &'static str,
    parameters: fn() -> ParameterSchema,
    compute: fn(Value) -> AgentResult<Value>,
}

#[async_trait]
impl Tool for CalculatorTool {
    async fn execute(&self, arguments: Value) -> AgentResult<Value> {
        (self.compute)(arguments)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters(&self) -> ParameterSchema {
        (self.parameters)()
    }
}

fn to_payload(tool: &str, value: impl serde::Serialize) -> AgentResult<Value> {
    serde_json::to_value(value).map_err(|e| Error::tool(tool, e.to_string()))
}

#[derive(Debug, Deserialize)]
struct PeParams {
    eps: f64,
    sector_pe: f64,
}

pub fn pe_valuation_tool() -> CalculatorTool {
    CalculatorTool {
        name: CALCULATE_PE_VALUATION,
        description: "Fair value with the P/E method: EPS times the sector average P/E.",
        parameters: || {
            ParameterSchema::new()
                .required("eps", ParamType::Number, "Earnings per share (TTM or forward)")
                .required("sector_pe", ParamType::Number, "Sector average P/E ratio")
        },
        compute: |arguments| {
            let p: PeParams = parse_arguments(CALCULATE_PE_VALUATION, arguments)?;
            let result = valuation::pe_valuation(p.eps, p.sector_pe);
            Ok(json!({
                "method": result.method,
                "fair_value": result.value,
                "notes": result.notes,
                "inputs": {"eps": p.eps, "sector_pe": p.sector_pe},
            }))
        },
    }
}

#[derive(Debug, Deserialize)]
struct GrahamParams {
    eps: f64,
    book_value_per_share: f64,
}

pub fn graham_number_tool() -> CalculatorTool {
    CalculatorTool {
        name: CALCULATE_GRAHAM_NUMBER,
        description: "Graham number, sqrt(22.5 x EPS x book value per share). A conservative \
                      intrinsic value estimate.",
        parameters: || {
            ParameterSchema::new()
                .required("eps", ParamType::Number, "Earnings per share")
                .required(
                    "book_value_per_share",
                    ParamType::Number,
                    "Book value per share",
                )
        },
        compute: |arguments| {
            let p: GrahamParams = parse_arguments(CALCULATE_GRAHAM_NUMBER, arguments)?;
            let result = valuation::graham_number(p.eps, p.book_value_per_share);
            Ok(json!({
                "method": result.method,
                "fair_value": result.value,
                "notes": result.notes,
                "inputs": {"eps": p.eps, "book_value_per_share": p.book_value_per_share},
            }))
        },
    }
}

#[derive(Debug, Deserialize)]
struct DcfParams {
    free_cash_flows: Vec<f64>,
    #[serde(default = "default_discount_rate")]
    discount_rate: f64,
    #[serde(default = "default_terminal_growth")]
    terminal_growth_rate: f64,
    #[serde(default)]
    shares_outstanding: Option<f64>,
}

fn default_discount_rate() -> f64 {
    0.10
}

fn default_terminal_growth() -> f64 {
    0.03
}

pub fn dcf_tool() -> CalculatorTool {
    CalculatorTool {
        name: CALCULATE_DCF,
        description: "Intrinsic value by discounted cash flow with a Gordon growth terminal \
                      value. Per share when shares_outstanding is given.",
        parameters: || {
            ParameterSchema::new()
                .required(
                    "free_cash_flows",
                    ParamType::Array,
                    "Projected free cash flow for each of the next N years",
                )
                .optional(
                    "discount_rate",
                    ParamType::Number,
                    "Required return as a fraction (default 0.10)",
                )
                .optional(
                    "terminal_growth_rate",
                    ParamType::Number,
                    "Perpetual growth as a fraction (default 0.03)",
                )
                .optional("shares_outstanding", ParamType::Number, "Shares outstanding")
        },
        compute: |arguments| {
            let p: DcfParams = parse_arguments(CALCULATE_DCF, arguments)?;
            let result = valuation::dcf(
                &p.free_cash_flows,
                p.discount_rate,
                p.terminal_growth_rate,
                p.shares_outstanding,
            );
            Ok(json!({
                "method": result.method,
                "fair_value": result.value,
                "notes": result.notes,
                "inputs": {
                    "free_cash_flows": p.free_cash_flows,
                    "discount_rate": p.discount_rate,
                    "terminal_growth_rate": p.terminal_growth_rate,
                    "shares_outstanding": p.shares_outstanding,
                },
            }))
        },
    }
}

#[derive(Debug, Deserialize)]
struct MarginParams {
    #[serde(alias = "intrinsic_value")]
    fair_value: f64,
    current_price: f64,
}

pub fn margin_of_safety_tool() -> CalculatorTool {
    CalculatorTool {
        name: CALCULATE_MARGIN_OF_SAFETY,
        description: "Margin of safety as a percent of the current price, with the \
                      recommendation it implies.",
        parameters: || {
            ParameterSchema::new()
                .required("fair_value", ParamType::Number, "Estimated fair value per share")
                .required("current_price", ParamType::Number, "Current market price")
        },
        compute: |arguments| {
            let p: MarginParams = parse_arguments(CALCULATE_MARGIN_OF_SAFETY, arguments)?;
            let margin = valuation::margin_of_safety(p.fair_value, p.current_price);
            Ok(json!({
                "fair_value": p.fair_value,
                "current_price": p.current_price,
                "margin_of_safety_pct": margin,
                "is_undervalued": margin.is_some_and(|m| m > 0.0),
                "implied_recommendation": Recommendation::from_margin(margin),
            }))
        },
    }
}

pub fn financial_health_tool() -> CalculatorTool {
    CalculatorTool {
        name: ANALYZE_FINANCIAL_HEALTH,
        description: "Red flags, strengths and a 0-100 health score from key ratios. Pass \
                      whichever ratios are known; percentages as numbers (15 for 15%).",
        parameters: || {
            ParameterSchema::new()
                .optional("current_ratio", ParamType::Number, "Current ratio")
                .optional("quick_ratio", ParamType::Number, "Quick ratio")
                .optional("debt_to_equity", ParamType::Number, "Debt to equity")
                .optional("interest_coverage", ParamType::Number, "Interest coverage")
                .optional("profit_margin", ParamType::Number, "Net profit margin, percent")
                .optional("roe", ParamType::Number, "Return on equity, percent")
                .optional("revenue_growth", ParamType::Number, "Revenue growth, percent")
                .optional("earnings_growth", ParamType::Number, "Earnings growth, percent")
        },
        compute: |arguments| {
            let inputs: HealthInputs = parse_arguments(ANALYZE_FINANCIAL_HEALTH, arguments)?;
            to_payload(ANALYZE_FINANCIAL_HEALTH, valuation::assess_health(&inputs))
        },
    }
}

pub fn compare_with_sector_tool() -> CalculatorTool {
    CalculatorTool {
        name: COMPARE_WITH_SECTOR,
        description: "Premium or discount of the company's P/E, P/B and ROE against sector \
                      averages.",
        parameters: || {
            ParameterSchema::new()
                .required("company_pe", ParamType::Number, "Company P/E")
                .required("sector_pe", ParamType::Number, "Sector average P/E")
                .optional("company_pb", ParamType::Number, "Company P/B")
                .optional("sector_pb", ParamType::Number, "Sector average P/B")
                .optional("company_roe", ParamType::Number, "Company ROE, percent")
                .optional("sector_roe", ParamType::Number, "Sector average ROE, percent")
        },
        compute: |arguments| {
            let inputs: SectorInputs = parse_arguments(COMPARE_WITH_SECTOR, arguments)?;
            to_payload(COMPARE_WITH_SECTOR, valuation::compare_with_sector(&inputs))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pe_valuation_tool() {
        let payload =
            tokio_test::block_on(pe_valuation_tool().execute(json!({"eps": 0.75, "sector_pe": 8.0})))
                .unwrap();
        assert_eq!(payload["fair_value"], 6.0);
        assert_eq!(payload["method"], "P/E Valuation");
    }

    #[test]
    fn test_margin_tool_accepts_intrinsic_value() {
        let payload = tokio_test::block_on(
            margin_of_safety_tool().execute(json!({"intrinsic_value": 6.0, "current_price": 5.17})),
        )
        .unwrap();
        assert_eq!(payload["margin_of_safety_pct"], 16.05);
        assert_eq!(payload["implied_recommendation"], "BUY");
        assert_eq!(payload["is_undervalued"], true);
    }

    #[tokio::test]
    async fn test_dcf_defaults() {
        let payload = dcf_tool()
            .execute(json!({"free_cash_flows": [100.0, 110.0]}))
            .await
            .unwrap();
        assert_eq!(payload["inputs"]["discount_rate"], 0.10);
        assert!(payload["fair_value"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_health_tool() {
        let payload = financial_health_tool()
            .execute(json!({"roe": 22.0, "debt_to_equity": 3.0}))
            .await
            .unwrap();
        assert_eq!(payload["health_score"], 50);
        assert_eq!(payload["red_flags"].as_array().unwrap().len(), 1);
        assert_eq!(payload["strengths"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sector_tool_skips_missing_metrics() {
        let payload = compare_with_sector_tool()
            .execute(json!({"company_pe": 5.0, "sector_pe": 10.0}))
            .await
            .unwrap();
        assert_eq!(payload["pe_vs_sector"]["discount_pct"], 50.0);
        assert!(payload.get("pb_vs_sector").is_none());
    }

    #[tokio::test]
    async fn test_bad_arguments_are_invalid() {
        let err = graham_number_tool()
            .execute(json!({"eps": "two"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
    }
}
