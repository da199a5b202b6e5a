use serde::{Deserialize, Serialize};

use crate::domain::sales::{AnalysisResult, SalesRecord};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSuggestionRequest {
    pub product_name: String,
    pub current_stock: i64,
    #[serde(default)]
    pub sales_data: Vec<SalesRecord>,
    pub analysis_period: String,
}

impl StockSuggestionRequest {
    /// Returns the name of every field that breaks the request contract.
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.product_name.trim().is_empty() {
            violations.push("productName must not be empty".to_string());
        }
        if self.current_stock < 0 {
            violations.push(format!(
                "currentStock must be greater than or equal to zero (got {})",
                self.current_stock
            ));
        }
        if self.analysis_period.trim().is_empty() {
            violations.push("analysisPeriod must not be empty".to_string());
        }
        violations
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSuggestion {
    pub next_period_stock: u64,
    pub safety_stock: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSuggestionResponse {
    pub product_name: String,
    pub analysis: AnalysisResult,
    pub suggestion: StockSuggestion,
    pub reasoning: String,
}
