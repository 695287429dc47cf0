//! File-backed fetch collaborator.
//!
//! Serves recorded exposure tables from a JSON file, for demo runs and
//! scenario replays. Lookups that find nothing return an empty table.

use crate::error::FetchError;
use crate::query::QuerySpec;
use crate::{KeyedFetcher, PredicateFetcher};
use exposure_core::desk::{DeskFilter, TRADING_DESK_FIELD};
use exposure_core::table::ExposureTable;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One recorded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRecord {
    /// Source identifier
    pub source: String,
    /// Trading desk
    pub desk: String,
    /// Source-local measure name
    pub measure: String,
    /// Local hour this record answers; every hour when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    /// Recorded rows
    #[serde(flatten)]
    pub table: ExposureTable,
}

/// In-memory store of [`FixtureRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    records: Vec<FixtureRecord>,
}

impl FixtureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load records from a JSON array file.
    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<FixtureRecord> = serde_json::from_str(&content)?;
        info!(path = %path.display(), records = records.len(), "Fixtures loaded");
        Ok(Self::from_records(records))
    }

    /// Wrap existing records.
    pub fn from_records(records: Vec<FixtureRecord>) -> Self {
        Self { records }
    }

    /// Add a record.
    pub fn push(&mut self, record: FixtureRecord) {
        self.records.push(record);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_record(mut self, record: FixtureRecord) -> Self {
        self.push(record);
        self
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Table recorded for the key. An hour-specific record beats an
    /// hour-less one; `hour = None` only sees hour-less records.
    pub fn lookup(
        &self,
        source: &str,
        desk: &str,
        measure: &str,
        hour: Option<u32>,
    ) -> Option<&ExposureTable> {
        let candidates = self
            .records
            .iter()
            .filter(|r| r.source == source && r.desk == desk && r.measure == measure);

        let mut fallback = None;
        for record in candidates {
            match (record.hour, hour) {
                (Some(h), Some(wanted)) if h == wanted => return Some(&record.table),
                (None, _) if fallback.is_none() => fallback = Some(&record.table),
                _ => {}
            }
        }
        fallback
    }

    fn source_of(query: &QuerySpec) -> Result<&str, FetchError> {
        query
            .source()
            .ok_or_else(|| FetchError::malformed_query(format!("query for '{}' names no source", query.measure)))
    }
}

impl PredicateFetcher for FixtureStore {
    fn fetch(&self, query: &QuerySpec, filter: &DeskFilter) -> Result<ExposureTable, FetchError> {
        let source = Self::source_of(query)?;
        let desk = filter.value_of(TRADING_DESK_FIELD).unwrap_or(query.desk.as_str());
        Ok(self
            .lookup(source, desk, &query.source_measure, None)
            .cloned()
            .unwrap_or_default())
    }
}

impl KeyedFetcher for FixtureStore {
    fn fetch(&self, query: &QuerySpec, hour: u32) -> Result<(ExposureTable, String), FetchError> {
        let source = Self::source_of(query)?;
        let path = format!("fixture://{}/{}/{}@{:02}", source, query.desk, query.source_measure, hour);
        let table = self
            .lookup(source, &query.desk, &query.source_measure, Some(hour))
            .cloned()
            .unwrap_or_default();
        Ok((table, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exposure_core::table::Cell;

    fn record(measure: &str, hour: Option<u32>, value: f64) -> FixtureRecord {
        FixtureRecord {
            source: "legacy".to_string(),
            desk: "EMEA LINEAR RATES".to_string(),
            measure: measure.to_string(),
            hour,
            table: ExposureTable::with_rows(
                ["Currency", "Exposures_USD"],
                vec![vec![Cell::from("EUR"), Cell::from(value)]],
            )
            .unwrap(),
        }
    }

    #[test]
    fn test_lookup_prefers_exact_hour() {
        let store = FixtureStore::new()
            .with_record(record("Vega", None, 1.0))
            .with_record(record("Vega", Some(17), 2.0));

        let at_17 = store.lookup("legacy", "EMEA LINEAR RATES", "Vega", Some(17)).unwrap();
        assert_eq!(at_17.sum_column("Exposures_USD"), 2.0);

        let at_9 = store.lookup("legacy", "EMEA LINEAR RATES", "Vega", Some(9)).unwrap();
        assert_eq!(at_9.sum_column("Exposures_USD"), 1.0);

        let no_hour = store.lookup("legacy", "EMEA LINEAR RATES", "Vega", None).unwrap();
        assert_eq!(no_hour.sum_column("Exposures_USD"), 1.0);
    }

    #[test]
    fn test_lookup_hour_specific_only() {
        let store = FixtureStore::new().with_record(record("Vega", Some(17), 2.0));
        assert!(store.lookup("legacy", "EMEA LINEAR RATES", "Vega", Some(9)).is_none());
        assert!(store.lookup("legacy", "EMEA LINEAR RATES", "Vega", None).is_none());
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"[{
            "source": "cirt_rra",
            "desk": "AMRS LINEAR RATES",
            "measure": "IR01",
            "columns": ["Currency", "IR01_USD"],
            "rows": [["USD", 1250000.0]]
        }]"#;
        let records: Vec<FixtureRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records[0].hour, None);
        assert_eq!(records[0].table.num_rows(), 1);
        assert_eq!(records[0].table.columns(), ["Currency", "IR01_USD"]);
    }

    #[test]
    fn test_load_rejects_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.json");
        std::fs::write(
            &path,
            r#"[{
                "source": "legacy",
                "desk": "EMEA LINEAR RATES",
                "measure": "CFTC-IRVega",
                "columns": ["Currency", "Exposures_USD"],
                "rows": [["EUR", 1.0], ["USD"]]
            }]"#,
        )
        .unwrap();

        let result = FixtureStore::load(&path);
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }
}
