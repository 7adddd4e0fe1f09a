use super::ui;
use crate::core::engine::RatingPolicy;
use crate::core::history::HistoryStore;
use anyhow::Result;
use comfy_table::Cell;

pub fn run(store: &HistoryStore, clear: bool) -> Result<()> {
    if clear {
        store.clear()?;
        println!("Evaluation history cleared.");
        return Ok(());
    }

    let records = store.list()?;
    if records.is_empty() {
        println!("No evaluations recorded yet. Run `ival screen` or `ival score` first.");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("When"),
        ui::header_cell("Symbol"),
        ui::header_cell("Intrinsic"),
        ui::header_cell("Safety"),
        ui::header_cell("Rating"),
        ui::header_cell("Policy"),
    ]);

    for record in &records {
        let rating_scale = match record.result.rating_policy {
            RatingPolicy::WeightedHundred => 1.0,
            RatingPolicy::HalfHalf => 0.01,
        };
        let policy_label = match record.result.rating_policy {
            RatingPolicy::WeightedHundred => "weighted-hundred",
            RatingPolicy::HalfHalf => "half-half",
        };
        table.add_row(vec![
            Cell::new(record.evaluated_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(&record.symbol),
            ui::format_optional_cell(Some(record.result.intrinsic_value), |v| format!("{v:.2}")),
            ui::margin_cell(record.result.margin_of_safety),
            ui::rating_cell(record.result.rating, rating_scale),
            Cell::new(policy_label),
        ]);
    }
    println!("{table}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{FinancialInputs, ScoringPolicy, evaluate};
    use crate::core::history::EvaluationRecord;
    use chrono::Utc;

    fn store_with_record(dir: &std::path::Path) -> HistoryStore {
        let store = HistoryStore::open(dir).unwrap();
        let result = evaluate(
            &FinancialInputs::default(),
            &ScoringPolicy::default(),
            RatingPolicy::WeightedHundred,
        )
        .unwrap();
        store
            .append(&EvaluationRecord {
                symbol: "AAPL".to_string(),
                evaluated_at: Utc::now(),
                result,
            })
            .unwrap();
        store
    }

    #[test]
    fn test_list_runs_on_populated_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_record(dir.path());
        assert!(run(&store, false).is_ok());
    }

    #[test]
    fn test_clear_empties_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_record(dir.path());

        run(&store, true).unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
