use std::path::Path;

use restock_core::{analyze_sales, SalesRecord};
use serde_json::Value;

use crate::commands::{read_json_file, CommandResult, EXIT_INVALID};

const COMMAND: &str = "analyze";

/// Accepts `{ "salesData": [...] }` or a bare array of sales records.
pub fn run(input: &Path) -> CommandResult {
    let document = match read_json_file(input) {
        Ok(document) => document,
        Err(message) => return CommandResult::failure(COMMAND, "input", message, EXIT_INVALID),
    };

    let records = match sales_records(document) {
        Ok(records) => records,
        Err(message) => return CommandResult::failure(COMMAND, "input", message, EXIT_INVALID),
    };

    match analyze_sales(&records) {
        Ok(analysis) => {
            let message = format!(
                "analyzed {} records: {} units sold, trend {}",
                records.len(),
                analysis.total_sold,
                analysis.sales_trend
            );
            CommandResult::success_with_data(COMMAND, message, serde_json::to_value(&analysis).ok())
        }
        Err(error) => {
            CommandResult::failure(COMMAND, "invalid_request", error.to_string(), EXIT_INVALID)
        }
    }
}

fn sales_records(document: Value) -> Result<Vec<SalesRecord>, String> {
    let records = match document {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut object) => object.remove("salesData").unwrap_or(Value::Array(Vec::new())),
        _ => return Err("expected a JSON array or an object with `salesData`".to_string()),
    };

    serde_json::from_value(records).map_err(|error| format!("invalid sales records: {error}"))
}
