use serde::{Deserialize, Serialize};

/// One line-item's quantity sold on a given date, as supplied by the order source.
///
/// `order_date` is kept verbatim; the analyzer parses it so that malformed
/// dates surface as a typed failure instead of a silent default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    pub order_date: String,
    pub quantity: u32,
}

impl SalesRecord {
    pub fn new(order_date: impl Into<String>, quantity: u32) -> Self {
        Self { order_date: order_date.into(), quantity }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesTrend {
    NoData,
    Stable,
    Increasing,
    Decreasing,
}

impl SalesTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::Stable => "stable",
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
        }
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, Self::Stable)
    }
}

impl std::fmt::Display for SalesTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_sold: u64,
    pub sales_trend: SalesTrend,
    pub peak_days: Vec<String>,
    pub average_daily_sales: f64,
}

impl AnalysisResult {
    pub fn no_data() -> Self {
        Self {
            total_sold: 0,
            sales_trend: SalesTrend::NoData,
            peak_days: Vec::new(),
            average_daily_sales: 0.0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.sales_trend != SalesTrend::NoData
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisResult, SalesRecord, SalesTrend};

    #[test]
    fn sales_record_uses_camel_case_wire_names() {
        let record: SalesRecord =
            serde_json::from_str(r#"{"orderDate":"2026-01-05","quantity":4}"#).expect("decode");
        assert_eq!(record, SalesRecord::new("2026-01-05", 4));
    }

    #[test]
    fn negative_quantity_is_rejected_at_decode() {
        let result =
            serde_json::from_str::<SalesRecord>(r#"{"orderDate":"2026-01-05","quantity":-1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn trend_serializes_as_snake_case() {
        let value = serde_json::to_value(SalesTrend::NoData).expect("encode");
        assert_eq!(value, "no_data");
        assert_eq!(SalesTrend::Decreasing.to_string(), "decreasing");
    }

    #[test]
    fn no_data_result_is_zeroed() {
        let result = AnalysisResult::no_data();
        assert_eq!(result.total_sold, 0);
        assert!(result.peak_days.is_empty());
        assert_eq!(result.average_daily_sales, 0.0);
        assert!(!result.has_data());

        let json = serde_json::to_value(&result).expect("encode");
        assert_eq!(json["salesTrend"], "no_data");
        assert_eq!(json["averageDailySales"], 0.0);
    }
}
