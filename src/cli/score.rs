use super::ui;
use crate::core::engine::{self, RatingPolicy, ScoringPolicy, ValuationResult};
use crate::core::fundamentals::FundamentalsProvider;
use crate::core::history::{EvaluationRecord, HistoryStore};
use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;
use tracing::warn;

pub async fn run(
    symbol: &str,
    provider: &(dyn FundamentalsProvider + Send + Sync),
    policy: &ScoringPolicy,
    rating_policy: RatingPolicy,
    history: Option<&HistoryStore>,
) -> Result<()> {
    let inputs = provider.fetch_fundamentals(symbol).await?;
    let result = engine::evaluate(&inputs, policy, rating_policy)?;

    if let Some(store) = history {
        let record = EvaluationRecord {
            symbol: symbol.to_string(),
            evaluated_at: Utc::now(),
            result: result.clone(),
        };
        if let Err(e) = store.append(&record) {
            warn!(%symbol, error = %e, "Failed to record evaluation");
        }
    }

    println!(
        "Company: {}\n",
        ui::style_text(symbol, ui::StyleType::Title)
    );
    display_breakdown(&result, inputs.stock_price, rating_policy);

    Ok(())
}

fn display_breakdown(result: &ValuationResult, stock_price: Option<f64>, policy: RatingPolicy) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Metric"),
        ui::header_cell("Value"),
        ui::header_cell("Threshold"),
    ]);

    let rows: Vec<(&str, Option<f64>, &str)> = vec![
        ("Gross profit margin (%)", Some(result.gross_profit_margin), "> 40"),
        ("Return on equity (%)", Some(result.return_on_equity), "> 20"),
        ("ROIC (%)", Some(result.roic), "> 30"),
        ("SG&A / revenue (%)", result.sga_to_revenue, "< 30"),
        ("Debt / equity", Some(result.debt_to_equity), "< 0.8"),
        ("Current ratio", Some(result.current_ratio), "> 1.5"),
        ("Cash ratio", Some(result.cash_ratio), "> 1"),
        ("Quick ratio", result.quick_ratio, "> 1"),
        ("Return on assets (%)", result.roa, "> 10"),
    ];
    for (label, value, threshold) in rows {
        table.add_row(vec![
            Cell::new(label),
            ui::format_optional_cell(value, |v| format!("{v:.2}")),
            Cell::new(threshold),
        ]);
    }
    println!("{table}");
    ui::print_separator();

    let (rating_scale, scale_note) = match policy {
        RatingPolicy::WeightedHundred => (1.0, "Rating scale: 0-100"),
        RatingPolicy::HalfHalf => (0.01, "Rating scale: 0-1"),
    };

    let mut valuation = ui::new_styled_table();
    valuation.set_header(vec![
        ui::header_cell("Price"),
        ui::header_cell("Intrinsic value"),
        ui::header_cell("Margin of safety"),
        ui::header_cell("Rating"),
    ]);
    valuation.add_row(vec![
        ui::format_optional_cell(stock_price, |p| format!("{p:.2}")),
        ui::format_optional_cell(Some(result.intrinsic_value), |v| format!("{v:.2}")),
        ui::margin_cell(result.margin_of_safety),
        ui::rating_cell(result.rating, rating_scale),
    ]);
    println!("\n{valuation}");
    println!("{}", ui::style_text(scale_note, ui::StyleType::Subtle));
}
