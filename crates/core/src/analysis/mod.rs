//! Sales Analyzer
//!
//! Turns raw per-order sales records for one product into the aggregate
//! statistics the reasoning step works from: total units, trend label,
//! peak days and average daily sales. Pure and synchronous; safe to call
//! from any thread.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};

use crate::domain::sales::{AnalysisResult, SalesRecord, SalesTrend};
use crate::errors::DateParseError;

/// Number of peak days reported.
pub const MAX_PEAK_DAYS: usize = 3;

/// Trend thresholds as exact ratios: increasing above 6/5 (1.2) of the first
/// half, decreasing below 4/5 (0.8).
const INCREASING_RATIO: (u128, u128) = (6, 5);
const DECREASING_RATIO: (u128, u128) = (4, 5);

const PEAK_DAY_FORMAT: &str = "%d %b";

#[derive(Clone, Debug, Default)]
pub struct SalesAnalyzer;

impl SalesAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, records: &[SalesRecord]) -> Result<AnalysisResult, DateParseError> {
        if records.is_empty() {
            return Ok(AnalysisResult::no_data());
        }

        let daily_totals = group_by_day(records)?;
        let total_sold: u64 = daily_totals.values().sum();

        let (Some(first_day), Some(last_day)) =
            (daily_totals.keys().next().copied(), daily_totals.keys().next_back().copied())
        else {
            return Ok(AnalysisResult::no_data());
        };
        let period_in_days = (last_day - first_day).num_days() + 1;
        let average_daily_sales = total_sold as f64 / period_in_days as f64;

        Ok(AnalysisResult {
            total_sold,
            sales_trend: classify_trend(&daily_totals),
            peak_days: peak_days(&daily_totals),
            average_daily_sales,
        })
    }
}

/// Convenience wrapper over [`SalesAnalyzer::analyze`].
pub fn analyze_sales(records: &[SalesRecord]) -> Result<AnalysisResult, DateParseError> {
    SalesAnalyzer::new().analyze(records)
}

/// Reads `YYYY-MM-DD` or an RFC 3339 timestamp. Timestamps keep the calendar
/// date of their own offset.
pub fn parse_order_date(index: usize, raw: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|_| DateParseError { index, value: raw.to_string() })
}

fn group_by_day(records: &[SalesRecord]) -> Result<BTreeMap<NaiveDate, u64>, DateParseError> {
    let mut daily_totals = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        let day = parse_order_date(index, &record.order_date)?;
        *daily_totals.entry(day).or_insert(0) += u64::from(record.quantity);
    }
    Ok(daily_totals)
}

fn classify_trend(daily_totals: &BTreeMap<NaiveDate, u64>) -> SalesTrend {
    if daily_totals.len() < 2 {
        return SalesTrend::Stable;
    }

    // Odd counts leave the extra day in the second half.
    let split = daily_totals.len() / 2;
    let first_half: u128 = daily_totals.values().take(split).map(|total| u128::from(*total)).sum();
    let second_half: u128 =
        daily_totals.values().skip(split).map(|total| u128::from(*total)).sum();

    if second_half * INCREASING_RATIO.1 > first_half * INCREASING_RATIO.0 {
        SalesTrend::Increasing
    } else if second_half * DECREASING_RATIO.1 < first_half * DECREASING_RATIO.0 {
        SalesTrend::Decreasing
    } else {
        SalesTrend::Stable
    }
}

fn peak_days(daily_totals: &BTreeMap<NaiveDate, u64>) -> Vec<String> {
    let mut ranked: Vec<(NaiveDate, u64)> =
        daily_totals.iter().map(|(day, total)| (*day, *total)).collect();
    // Stable sort over date-ordered input: equal totals stay in ascending date order.
    ranked.sort_by(|left, right| right.1.cmp(&left.1));

    ranked
        .into_iter()
        .take(MAX_PEAK_DAYS)
        .map(|(day, total)| format!("{}: {} units", day.format(PEAK_DAY_FORMAT), total))
        .collect()
}
