//! Persisted evaluation history. Every screen or score run appends its
//! results here so past ratings can be reviewed without refetching data.

use crate::core::engine::ValuationResult;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One stored evaluation: the company label supplied by the caller, when it
/// was scored, and the full engine output. Values are stored as JSON;
/// serde_json writes any non-finite float as null, which keeps the records
/// transport-safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub symbol: String,
    pub evaluated_at: DateTime<Utc>,
    pub result: ValuationResult,
}

pub struct HistoryStore {
    partition: PartitionHandle,
    // Keeps the keyspace alive for as long as the partition handle is used.
    _keyspace: Keyspace,
}

impl HistoryStore {
    pub fn open(data_path: &Path) -> Result<Self> {
        let history_dir = data_path.join("history");
        std::fs::create_dir_all(&history_dir)
            .with_context(|| format!("Failed to create directory: {}", history_dir.display()))?;

        let keyspace = fjall::Config::new(&history_dir)
            .open()
            .with_context(|| format!("Failed to open history store: {}", history_dir.display()))?;
        let partition = keyspace
            .open_partition("evaluations", PartitionCreateOptions::default())
            .context("Failed to open evaluations partition")?;

        Ok(Self {
            partition,
            _keyspace: keyspace,
        })
    }

    pub fn append(&self, record: &EvaluationRecord) -> Result<()> {
        // Zero-padded millisecond timestamp keys keep the partition in
        // chronological order; the symbol suffix disambiguates same-instant
        // rows from a batch run.
        let key = format!(
            "{:020}/{}",
            record.evaluated_at.timestamp_millis(),
            record.symbol
        );
        let value = serde_json::to_vec(record)?;
        self.partition.insert(key.as_bytes(), value)?;
        debug!(symbol = %record.symbol, "Recorded evaluation");
        Ok(())
    }

    /// Returns all stored evaluations, newest first.
    pub fn list(&self) -> Result<Vec<EvaluationRecord>> {
        let mut records = Vec::new();
        for entry in self.partition.iter().rev() {
            let (_key, value) = entry.context("Failed to read history entry")?;
            let record: EvaluationRecord =
                serde_json::from_slice(&value).context("Failed to decode history entry")?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn clear(&self) -> Result<()> {
        let keys: Vec<_> = self
            .partition
            .iter()
            .map(|entry| entry.map(|(key, _value)| key))
            .collect::<Result<_, _>>()
            .context("Failed to read history entries")?;
        for key in keys {
            self.partition.remove(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{FinancialInputs, RatingPolicy, ScoringPolicy, evaluate};
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn record(symbol: &str, at: DateTime<Utc>) -> EvaluationRecord {
        let result = evaluate(
            &FinancialInputs {
                earnings_per_share: Some(5.0),
                stock_price: Some(50.0),
                ..Default::default()
            },
            &ScoringPolicy::default(),
            RatingPolicy::WeightedHundred,
        )
        .unwrap();
        EvaluationRecord {
            symbol: symbol.to_string(),
            evaluated_at: at,
            result,
        }
    }

    #[test]
    fn test_append_and_list_newest_first() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path()).unwrap();

        let t1 = Utc.with_ymd_and_hms(2024, 11, 1, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 11, 2, 9, 0, 0).unwrap();
        store.append(&record("AAPL", t1)).unwrap();
        store.append(&record("MSFT", t2)).unwrap();

        let records = store.list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "MSFT");
        assert_eq!(records[1].symbol, "AAPL");
    }

    #[test]
    fn test_round_trip_preserves_unavailable_markers() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path()).unwrap();

        let rec = record("AAPL", Utc::now());
        assert!(rec.result.quick_ratio.is_none());
        store.append(&rec).unwrap();

        let restored = store.list().unwrap().pop().unwrap();
        assert_eq!(restored, rec);
        assert!(restored.result.quick_ratio.is_none());
    }

    #[test]
    fn test_clear() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path()).unwrap();

        store.append(&record("AAPL", Utc::now())).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);

        store.clear().unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
