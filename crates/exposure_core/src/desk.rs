//! Trading desk configuration and the row predicate derived from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Division used when a desk does not name one.
pub const DEFAULT_DIVISION: &str = "FICC";

/// Column the division clause is evaluated against.
pub const DIVISION_FIELD: &str = "DivisionName";

/// Hierarchy fields that contribute an equality clause to a [`DeskFilter`].
pub const FILTER_FIELDS: [&str; 2] = ["VolckerBusinessArea", "VolckerTradingDesk"];

/// Hierarchy field naming the trading desk.
pub const TRADING_DESK_FIELD: &str = "VolckerTradingDesk";

/// One trading desk (business hierarchy node).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Desk display name (reported as `level`)
    pub name: String,

    /// Division; [`DEFAULT_DIVISION`] when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,

    /// Hierarchy field name -> value
    #[serde(default)]
    pub hierarchy: BTreeMap<String, String>,

    /// Sources this desk is aggregated from, in run order
    #[serde(default)]
    pub sources: Vec<String>,
}

impl DeskConfig {
    /// Create a desk with no hierarchy fields and no sources.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            division: None,
            hierarchy: BTreeMap::new(),
            sources: Vec::new(),
        }
    }

    /// Set the division.
    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }

    /// Add a hierarchy field.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.hierarchy.insert(field.into(), value.into());
        self
    }

    /// Add a source to aggregate from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Effective division.
    pub fn division(&self) -> &str {
        self.division.as_deref().unwrap_or(DEFAULT_DIVISION)
    }

    /// Row predicate for predicate-queried sources.
    pub fn filter(&self) -> DeskFilter {
        DeskFilter::for_desk(self)
    }
}

/// Equality clause `field == value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterClause {
    /// Column name
    pub field: String,
    /// Required value
    pub value: String,
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == '{}'", self.field, self.value)
    }
}

/// Conjunction of equality clauses.
///
/// Clause order is deterministic: the division clause first, then the
/// recognised hierarchy fields in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskFilter {
    clauses: Vec<FilterClause>,
}

impl DeskFilter {
    /// Filter on division only.
    pub fn division(division: impl Into<String>) -> Self {
        Self {
            clauses: vec![FilterClause {
                field: DIVISION_FIELD.to_string(),
                value: division.into(),
            }],
        }
    }

    /// Build the filter for `desk`: division AND every recognised
    /// hierarchy field. Unrecognised hierarchy fields are ignored.
    pub fn for_desk(desk: &DeskConfig) -> Self {
        let base = Self::division(desk.division());
        // BTreeMap iteration keeps clause order reproducible
        desk.hierarchy
            .iter()
            .filter(|(field, _)| FILTER_FIELDS.contains(&field.as_str()))
            .fold(base, |filter, (field, value)| filter.and(field, value))
    }

    /// Add an equality clause.
    pub fn and(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push(FilterClause {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Clauses in evaluation order.
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// Value required for `field`, if the filter constrains it.
    pub fn value_of(&self, field: &str) -> Option<&str> {
        self.clauses
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.value.as_str())
    }

    /// Evaluate against a row given as field -> value.
    pub fn matches<'a, F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        self.clauses
            .iter()
            .all(|c| lookup(&c.field) == Some(c.value.as_str()))
    }
}

impl fmt::Display for DeskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" & ")?;
            }
            write!(f, "({})", clause)?;
        }
        Ok(())
    }
}
