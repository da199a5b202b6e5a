use std::fmt::Write as _;

use crate::reasoning::ReasoningContext;

pub const SYSTEM_PROMPT: &str = "You are an inventory planning assistant for a small online store. \
You receive pre-computed sales statistics for one product and recommend how much stock to hold \
for the next period. Reply with a single JSON object and nothing else.";

/// Exact output shape the engine is asked to produce.
pub const RESPONSE_SHAPE: &str = r#"{
  "productName": "<string>",
  "suggestion": {
    "nextPeriodStock": <integer >= 0>,
    "safetyStock": <integer >= 0>
  },
  "reasoning": "<two to four sentences explaining the numbers>"
}"#;

pub fn render_user_prompt(context: &ReasoningContext) -> String {
    let analysis = &context.analysis;
    let guidance = &context.guidance;
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Product: {}", context.product_name);
    let _ = writeln!(prompt, "Current stock: {} units", context.current_stock);
    let _ = writeln!(prompt, "Analysis period: {}", context.analysis_period);
    prompt.push('\n');

    let _ = writeln!(prompt, "Sales statistics:");
    let _ = writeln!(prompt, "- total sold: {} units", analysis.total_sold);
    let _ = writeln!(prompt, "- trend: {}", analysis.sales_trend);
    let _ = writeln!(prompt, "- average daily sales: {:.2} units", analysis.average_daily_sales);
    if analysis.peak_days.is_empty() {
        let _ = writeln!(prompt, "- peak days: none");
    } else {
        let _ = writeln!(prompt, "- peak days: {}", analysis.peak_days.join(", "));
    }
    prompt.push('\n');

    let _ = writeln!(prompt, "Guidance (advisory, use your judgement):");
    let _ = writeln!(
        prompt,
        "- next period stock should approximate average daily sales x {} days (about {} units)",
        guidance.horizon_days, guidance.baseline_next_period_stock
    );
    if guidance.trend_buffer_ratio > 0.0 {
        let _ = writeln!(
            prompt,
            "- the trend is {}, so add a buffer of roughly {:.0}% on top of that baseline",
            analysis.sales_trend,
            guidance.trend_buffer_ratio * 100.0
        );
    }
    let _ = writeln!(
        prompt,
        "- safety stock baseline is about {:.0}% of the next period suggestion",
        guidance.safety_stock_ratio * 100.0
    );
    let _ = writeln!(prompt, "- take current stock into account in the reasoning");
    prompt.push('\n');

    let _ = writeln!(prompt, "Respond with JSON in exactly this shape:");
    prompt.push_str(RESPONSE_SHAPE);
    prompt
}
