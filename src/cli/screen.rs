use super::ui;
use crate::core::config::Universe;
use crate::core::engine::{self, RatingPolicy, ScoringPolicy, ValuationResult};
use crate::core::fundamentals::FundamentalsProvider;
use crate::core::history::{EvaluationRecord, HistoryStore};
use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;
use futures::future::join_all;
use indicatif::ProgressBar;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ScreenRow {
    pub symbol: String,
    pub stock_price: Option<f64>,
    pub result: Option<ValuationResult>,
    pub error: Option<String>,
}

pub async fn run(
    universe: &Universe,
    provider: &(dyn FundamentalsProvider + Send + Sync),
    policy: &ScoringPolicy,
    rating_policy: RatingPolicy,
    history: Option<&HistoryStore>,
) -> Result<()> {
    if universe.symbols.is_empty() {
        println!("Universe '{}' has no symbols to screen.", universe.name);
        return Ok(());
    }

    let pb = ui::new_progress_bar(universe.symbols.len() as u64, true);
    pb.set_message("Screening companies...");

    let rows = screen_universe(universe, provider, policy, rating_policy, &pb).await;
    pb.finish_and_clear();

    if let Some(store) = history {
        let evaluated_at = Utc::now();
        for row in &rows {
            let Some(result) = &row.result else { continue };
            let record = EvaluationRecord {
                symbol: row.symbol.clone(),
                evaluated_at,
                result: result.clone(),
            };
            if let Err(e) = store.append(&record) {
                warn!(symbol = %row.symbol, error = %e, "Failed to record evaluation");
            }
        }
    }

    println!(
        "Universe: {}\n",
        ui::style_text(&universe.name, ui::StyleType::Title)
    );
    display_rows(&rows, rating_policy);

    Ok(())
}

/// Fetches and scores every symbol in the universe concurrently. A fetch or
/// validation failure becomes an error row; it never aborts the batch.
pub async fn screen_universe(
    universe: &Universe,
    provider: &(dyn FundamentalsProvider + Send + Sync),
    policy: &ScoringPolicy,
    rating_policy: RatingPolicy,
    pb: &ProgressBar,
) -> Vec<ScreenRow> {
    let fetches = universe.symbols.iter().map(|symbol| {
        let pb_clone = pb.clone();
        async move {
            let res = provider.fetch_fundamentals(symbol).await;
            pb_clone.inc(1);
            (symbol.clone(), res)
        }
    });

    let mut rows: Vec<ScreenRow> = join_all(fetches)
        .await
        .into_iter()
        .map(|(symbol, fetched)| match fetched {
            Ok(inputs) => match engine::evaluate(&inputs, policy, rating_policy) {
                Ok(result) => ScreenRow {
                    symbol,
                    stock_price: inputs.stock_price,
                    result: Some(result),
                    error: None,
                },
                Err(e) => ScreenRow {
                    symbol,
                    stock_price: inputs.stock_price,
                    result: None,
                    error: Some(e.to_string()),
                },
            },
            Err(e) => {
                debug!("Fundamentals fetch error for {}: {}", symbol, e);
                ScreenRow {
                    symbol,
                    stock_price: None,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect();

    // Highest rating first; rows without a result sink to the bottom.
    rows.sort_by(|a, b| {
        let ra = a.result.as_ref().map(|r| r.rating);
        let rb = b.result.as_ref().map(|r| r.rating);
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    rows
}

fn display_rows(rows: &[ScreenRow], rating_policy: RatingPolicy) {
    let rating_scale = match rating_policy {
        RatingPolicy::WeightedHundred => 1.0,
        RatingPolicy::HalfHalf => 0.01,
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Price"),
        ui::header_cell("Intrinsic"),
        ui::header_cell("Safety"),
        ui::header_cell("Rating"),
        ui::header_cell("GPM (%)"),
        ui::header_cell("ROE (%)"),
        ui::header_cell("ROIC (%)"),
        ui::header_cell("D/E"),
    ]);

    for row in rows {
        match &row.result {
            Some(result) => {
                table.add_row(vec![
                    Cell::new(&row.symbol),
                    ui::format_optional_cell(row.stock_price, |p| format!("{p:.2}")),
                    ui::format_optional_cell(Some(result.intrinsic_value), |v| format!("{v:.2}")),
                    ui::margin_cell(result.margin_of_safety),
                    ui::rating_cell(result.rating, rating_scale),
                    ui::format_optional_cell(Some(result.gross_profit_margin), |v| {
                        format!("{v:.1}")
                    }),
                    ui::format_optional_cell(Some(result.return_on_equity), |v| format!("{v:.1}")),
                    ui::format_optional_cell(Some(result.roic), |v| format!("{v:.1}")),
                    ui::format_optional_cell(Some(result.debt_to_equity), |v| format!("{v:.2}")),
                ]);
            }
            None => {
                let mut cells = vec![Cell::new(&row.symbol)];
                cells.extend((0..8).map(|_| ui::na_cell(true)));
                table.add_row(cells);
            }
        }
    }

    println!("{table}");

    let errors: Vec<&ScreenRow> = rows.iter().filter(|r| r.error.is_some()).collect();
    if !errors.is_empty() {
        println!();
        for row in errors {
            println!(
                "{}",
                ui::style_text(
                    &format!("{}: {}", row.symbol, row.error.as_deref().unwrap_or("")),
                    ui::StyleType::Error
                )
            );
        }
    }
}
