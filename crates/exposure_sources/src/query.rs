//! Per-measure query specification passed to fetch collaborators.

use exposure_core::catalog::{ResolvedParams, SOURCE_KEY};
use exposure_core::desk::DeskConfig;
use exposure_core::table::MEASURE_COL;
use exposure_core::timestamp::JobTimestamp;
use serde::Serialize;
use serde_json::{Map, Value};

/// Query key carrying the job's IANA zone (keyed sources only).
pub const TZ_KEY: &str = "tz";

/// One measure's query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySpec {
    /// Desk display name
    pub desk: String,
    /// Canonical measure name
    pub measure: String,
    /// Name the source knows the measure by
    pub source_measure: String,
    /// Merged query parameters (`Measure`, resolved fields, ...)
    pub params: Map<String, Value>,
}

impl QuerySpec {
    /// Query for a predicate source: `Measure` plus every resolved field.
    pub fn predicate(desk: &DeskConfig, measure: &str, params: &ResolvedParams) -> Self {
        let source_measure = params.source_measure_name(measure).to_string();

        let mut query = Map::new();
        query.insert(MEASURE_COL.to_string(), Value::String(source_measure.clone()));
        for (key, value) in params.fields() {
            query.insert(key.clone(), value.clone());
        }

        Self {
            desk: desk.name.clone(),
            measure: measure.to_string(),
            source_measure,
            params: query,
        }
    }

    /// Query for a keyed source: the predicate query plus the desk
    /// hierarchy fields and the job's zone.
    pub fn keyed(
        desk: &DeskConfig,
        measure: &str,
        params: &ResolvedParams,
        at: &JobTimestamp,
    ) -> Self {
        let mut spec = Self::predicate(desk, measure, params);
        for (field, value) in &desk.hierarchy {
            spec.params.insert(field.clone(), Value::String(value.clone()));
        }
        spec.params.insert(
            TZ_KEY.to_string(),
            Value::String(at.timezone_name().to_string()),
        );
        spec
    }

    /// Source identifier the query targets.
    pub fn source(&self) -> Option<&str> {
        self.params.get(SOURCE_KEY).and_then(Value::as_str)
    }

    /// One query parameter.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// One query parameter as a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(Value::as_str)
    }
}
