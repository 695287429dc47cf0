//! Missing-measure records and the result envelope handed to reporting.

use crate::catalog::{ResolvedParams, CALC_LEVEL_KEY, MEASURE_NAMES_KEY, SOURCE_KEY};
use crate::timestamp::SnapshotWindow;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Envelope key of the missing-measure mapping.
pub const MISSING_KEY: &str = "measuresMissingExposures";

/// Envelope key of the desk display name.
pub const LEVEL_KEY: &str = "level";

/// Envelope key of the snapshot window.
pub const SNAPSHOT_KEY: &str = "snapshot";

const DESCRIPTION_MARKER: &str = " missing from ";

/// Measure (or pre-formatted description) -> sources it was missing from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissingExposureRecord {
    entries: BTreeMap<String, Vec<String>>,
}

impl MissingExposureRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as missing from `source`.
    ///
    /// Re-recording a key replaces its source list with `[source]`.
    pub fn record(&mut self, key: impl Into<String>, source: impl Into<String>) {
        self.entries.insert(key.into(), vec![source.into()]);
    }

    /// Whether `key` is recorded.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Sources `key` was missing from.
    pub fn sources_for(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Number of recorded keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// (key, sources) pairs, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Render one alert line for `key`.
    ///
    /// Keys that are already descriptions are returned verbatim.
    pub fn describe(key: &str, sources: &[String]) -> String {
        if key.contains(DESCRIPTION_MARKER) {
            key.to_string()
        } else {
            format!("{} missing from [{}] datasource", key, sources.join(", "))
        }
    }

    /// Alert lines for every recorded key, sorted by key.
    pub fn descriptions(&self) -> Vec<String> {
        self.iter()
            .map(|(key, sources)| Self::describe(key, sources))
            .collect()
    }
}

/// Result of one (desk, source) aggregation, consumed by reporting/alerting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Source identifier this envelope was produced from
    pub source: String,

    /// Desk display name
    pub level: String,

    /// Measures expected for this desk/source, in iteration order
    pub measure_names: Vec<String>,

    /// Measures that produced no rows; omitted when nothing is missing
    #[serde(
        rename = "measuresMissingExposures",
        default,
        skip_serializing_if = "MissingExposureRecord::is_empty"
    )]
    pub measures_missing_exposures: MissingExposureRecord,

    /// Snapshot window of the job timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotWindow>,

    /// Every other resolved field (calc_level, overrides, connection params)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResultEnvelope {
    /// Assemble an envelope from the run's parameters and missing record.
    pub fn new(
        params: ResolvedParams,
        level: impl Into<String>,
        missing: MissingExposureRecord,
    ) -> Self {
        let source = params.source().to_string();
        let measure_names = params.measure_names().to_vec();

        let mut fields = params.into_fields();
        for key in [SOURCE_KEY, MEASURE_NAMES_KEY, MISSING_KEY, LEVEL_KEY, SNAPSHOT_KEY] {
            fields.remove(key);
        }

        Self {
            source,
            level: level.into(),
            measure_names,
            measures_missing_exposures: missing,
            snapshot: None,
            fields,
        }
    }

    /// Stamp the snapshot window.
    pub fn with_snapshot(mut self, window: SnapshotWindow) -> Self {
        self.snapshot = Some(window);
        self
    }

    /// Calculation level tag, if configured.
    pub fn calc_level(&self) -> Option<&Value> {
        self.fields.get(CALC_LEVEL_KEY)
    }

    /// Whether any measure is missing.
    pub fn has_missing(&self) -> bool {
        !self.measures_missing_exposures.is_empty()
    }

    /// Missing keys, in expected-measure order followed by any
    /// free-form description keys.
    pub fn missing_in_order(&self) -> Vec<&str> {
        let missing = &self.measures_missing_exposures;
        let mut ordered: Vec<&str> = self
            .measure_names
            .iter()
            .map(String::as_str)
            .filter(|m| missing.contains(m))
            .collect();
        ordered.extend(
            missing
                .keys()
                .filter(|k| !self.measure_names.iter().any(|m| m == *k)),
        );
        ordered
    }
}
