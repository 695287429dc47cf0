//! Source catalog and parameter resolution.
//!
//! A [`SourceCatalog`] maps a source identifier to an ordered list of field
//! groups. [`SourceCatalog::resolve`] overlays those groups onto a base map
//! seeded with `source` to produce the [`ResolvedParams`] for one run.

use crate::error::{ExposureError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Key holding the source identifier.
pub const SOURCE_KEY: &str = "source";

/// Key holding the ordered list of expected measures.
pub const MEASURE_NAMES_KEY: &str = "measure_names";

/// Key holding canonical -> source-local measure renames.
pub const MEASURE_NAME_OVERRIDES_KEY: &str = "measure_name_overrides";

/// Key holding the calculation level tag.
pub const CALC_LEVEL_KEY: &str = "calc_level";

/// One overlay of named fields.
pub type FieldGroup = Map<String, Value>;

/// Static mapping from source identifier to its field groups.
///
/// Loaded once and read-only afterwards; share it by reference across
/// concurrent runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceCatalog {
    sources: BTreeMap<String, Vec<FieldGroup>>,
}

impl SourceCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the field groups of `source`.
    pub fn insert(&mut self, source: impl Into<String>, groups: Vec<FieldGroup>) {
        self.sources.insert(source.into(), groups);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_source(mut self, source: impl Into<String>, groups: Vec<FieldGroup>) -> Self {
        self.insert(source, groups);
        self
    }

    /// Whether `source` is catalogued.
    pub fn contains(&self, source: &str) -> bool {
        self.sources.contains_key(source)
    }

    /// Catalogued source identifiers, sorted.
    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Field groups of `source`, in catalog order.
    pub fn groups(&self, source: &str) -> Option<&[FieldGroup]> {
        self.sources.get(source).map(Vec::as_slice)
    }

    /// Number of catalogued sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Merge every field group of `source` over `{source: <source>}`.
    ///
    /// Groups are applied in catalog order; on key collision the later
    /// group wins. The `source` field always ends up equal to the requested
    /// identifier.
    ///
    /// # Errors
    ///
    /// `ExposureError::Configuration` when `source` is not catalogued or the
    /// merged fields lack a valid `measure_names` list.
    pub fn resolve(&self, source: &str) -> Result<ResolvedParams> {
        let groups = self.groups(source).ok_or_else(|| {
            ExposureError::configuration(format!("unknown source '{}'", source))
        })?;

        let mut fields = Map::new();
        fields.insert(SOURCE_KEY.to_string(), Value::String(source.to_string()));
        for group in groups {
            for (key, value) in group {
                fields.insert(key.clone(), value.clone());
            }
        }
        fields.insert(SOURCE_KEY.to_string(), Value::String(source.to_string()));

        let measure_names = parse_measure_names(source, fields.get(MEASURE_NAMES_KEY))?;
        let overrides = parse_overrides(source, fields.get(MEASURE_NAME_OVERRIDES_KEY))?;

        Ok(ResolvedParams {
            source: source.to_string(),
            fields,
            measure_names,
            overrides,
        })
    }

    /// Check every catalogued source resolves. Returns one message per
    /// broken source.
    pub fn validate(&self) -> Vec<String> {
        self.source_ids()
            .filter_map(|id| self.resolve(id).err().map(|e| e.to_string()))
            .collect()
    }
}

fn parse_measure_names(source: &str, value: Option<&Value>) -> Result<Vec<String>> {
    let list = value.and_then(Value::as_array).ok_or_else(|| {
        ExposureError::configuration(format!(
            "source '{}' has no '{}' list",
            source, MEASURE_NAMES_KEY
        ))
    })?;

    let mut seen = BTreeSet::new();
    let mut names = Vec::with_capacity(list.len());
    for item in list {
        let name = item.as_str().ok_or_else(|| {
            ExposureError::configuration(format!(
                "source '{}' lists a non-string measure: {}",
                source, item
            ))
        })?;
        if !seen.insert(name) {
            return Err(ExposureError::configuration(format!(
                "source '{}' lists measure '{}' more than once",
                source, name
            )));
        }
        names.push(name.to_string());
    }
    Ok(names)
}

/// Overrides may be one table or a list of single-entry tables.
fn parse_overrides(source: &str, value: Option<&Value>) -> Result<BTreeMap<String, String>> {
    let mut overrides = BTreeMap::new();
    let tables: Vec<&Map<String, Value>> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(map)) => vec![map],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| {
                    ExposureError::configuration(format!(
                        "source '{}' has a malformed measure override: {}",
                        source, item
                    ))
                })
            })
            .collect::<Result<_>>()?,
        Some(other) => {
            return Err(ExposureError::configuration(format!(
                "source '{}' has malformed '{}': {}",
                source, MEASURE_NAME_OVERRIDES_KEY, other
            )))
        }
    };

    for table in tables {
        for (canonical, local) in table {
            let local = local.as_str().ok_or_else(|| {
                ExposureError::configuration(format!(
                    "source '{}' overrides '{}' with a non-string name",
                    source, canonical
                ))
            })?;
            overrides.insert(canonical.clone(), local.to_string());
        }
    }
    Ok(overrides)
}

/// Merged working configuration for one (desk, source) run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    source: String,
    fields: Map<String, Value>,
    measure_names: Vec<String>,
    overrides: BTreeMap<String, String>,
}

impl ResolvedParams {
    /// Source identifier.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Expected measures, in iteration order.
    pub fn measure_names(&self) -> &[String] {
        &self.measure_names
    }

    /// All merged fields, including `source` and `measure_names`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// One merged field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Calculation level tag, if configured.
    pub fn calc_level(&self) -> Option<&Value> {
        self.fields.get(CALC_LEVEL_KEY)
    }

    /// Canonical -> source-local measure names.
    pub fn measure_name_overrides(&self) -> &BTreeMap<String, String> {
        &self.overrides
    }

    /// Name `measure` is known by inside this source.
    pub fn source_measure_name<'a>(&'a self, measure: &'a str) -> &'a str {
        self.overrides
            .get(measure)
            .map(String::as_str)
            .unwrap_or(measure)
    }

    /// Consume into the merged field map.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}
