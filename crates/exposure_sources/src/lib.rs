//! # Exposure Sources
//!
//! Adapter layer: fetches one measure's exposure rows from one backing
//! source and normalises it into the common tabular shape.
//!
//! Two source families exist and the set is closed:
//!
//! - **Predicate sources** ([`PredicateSource`]): aggregation/reporting stores
//!   queried with a [`DeskFilter`](exposure_core::desk::DeskFilter) row predicate.
//! - **Keyed sources** ([`KeyedSource`]): legacy positional stores addressed by
//!   desk, measure and hour of day.
//!
//! The actual reads are delegated to collaborators implementing
//! [`PredicateFetcher`] / [`KeyedFetcher`]. A collaborator returns an empty
//! table when data does not exist; it errors only on real I/O failures.
//! [`FixtureStore`] is a file-backed collaborator implementing both.

mod error;
mod fixture;
mod keyed;
mod kind;
mod predicate;
mod query;

pub use error::FetchError;
pub use fixture::{FixtureRecord, FixtureStore};
pub use keyed::KeyedSource;
pub use kind::{SourceKind, KEYED_SOURCE, PREDICATE_SOURCES};
pub use predicate::PredicateSource;
pub use query::QuerySpec;

use exposure_core::catalog::ResolvedParams;
use exposure_core::desk::{DeskConfig, DeskFilter};
use exposure_core::table::ExposureTable;
use exposure_core::timestamp::JobTimestamp;
use exposure_core::Result;

/// Collaborator reading a predicate-queried store.
pub trait PredicateFetcher: Send + Sync {
    /// Fetch the rows of `query.source_measure` selected by `filter`.
    fn fetch(&self, query: &QuerySpec, filter: &DeskFilter) -> std::result::Result<ExposureTable, FetchError>;
}

/// Collaborator reading a keyed store.
pub trait KeyedFetcher: Send + Sync {
    /// Fetch the rows of `query.source_measure` for local hour `hour`.
    ///
    /// Returns the table and an opaque provenance path.
    fn fetch(&self, query: &QuerySpec, hour: u32) -> std::result::Result<(ExposureTable, String), FetchError>;
}

/// Outcome of one measure fetch after canonicalisation.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureFetch {
    /// Rows tagged with the canonical measure name
    Populated(ExposureTable),
    /// No rows; the table carries the schema only
    Empty(ExposureTable),
}

impl MeasureFetch {
    /// Classify a canonicalised table.
    pub fn from_table(table: ExposureTable) -> Self {
        if table.is_empty() {
            Self::Empty(table)
        } else {
            Self::Populated(table)
        }
    }

    /// Whether the fetch produced no rows.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.table().num_rows()
    }

    /// Underlying table.
    pub fn table(&self) -> &ExposureTable {
        match self {
            Self::Populated(t) | Self::Empty(t) => t,
        }
    }

    /// Consume into the underlying table.
    pub fn into_table(self) -> ExposureTable {
        match self {
            Self::Populated(t) | Self::Empty(t) => t,
        }
    }

    /// Replace with an empty table of the same schema.
    pub fn suppressed(self) -> Self {
        Self::Empty(self.table().empty_like())
    }
}

/// Raw and canonicalised result of one measure fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMeasure {
    /// Table as returned by the source (after column renaming only)
    pub snapshot: ExposureTable,
    /// Canonicalised rows for the running exposure table
    pub exposures: MeasureFetch,
}

/// The fetch collaborators available to a run.
#[derive(Clone, Copy)]
pub struct Fetchers<'a> {
    /// Predicate-store collaborator
    pub predicate: &'a dyn PredicateFetcher,
    /// Keyed-store collaborator
    pub keyed: &'a dyn KeyedFetcher,
}

impl<'a> Fetchers<'a> {
    /// Pair two collaborators.
    pub fn new(predicate: &'a dyn PredicateFetcher, keyed: &'a dyn KeyedFetcher) -> Self {
        Self { predicate, keyed }
    }

    /// Use one collaborator for both source families.
    pub fn single<T>(store: &'a T) -> Self
    where
        T: PredicateFetcher + KeyedFetcher,
    {
        Self {
            predicate: store,
            keyed: store,
        }
    }
}

/// Source adapter selected once per (desk, source) run.
pub enum SourceAdapter<'a> {
    /// Predicate-queried source
    Predicate(PredicateSource<'a>),
    /// Key-queried source
    Keyed(KeyedSource<'a>),
}

impl<'a> SourceAdapter<'a> {
    /// Pick the adapter for `source_id`.
    ///
    /// The desk filter is only built for predicate sources.
    ///
    /// # Errors
    ///
    /// `ExposureError::Configuration` for an identifier outside the closed
    /// set of known sources.
    pub fn select(source_id: &str, desk: &DeskConfig, fetchers: Fetchers<'a>) -> Result<Self> {
        Ok(match SourceKind::of(source_id)? {
            SourceKind::Predicate => Self::Predicate(PredicateSource::new(fetchers.predicate, desk)),
            SourceKind::Keyed => Self::Keyed(KeyedSource::new(fetchers.keyed)),
        })
    }

    /// Family of the selected adapter.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Predicate(_) => SourceKind::Predicate,
            Self::Keyed(_) => SourceKind::Keyed,
        }
    }

    /// Fetch one measure.
    pub fn fetch_measure(
        &self,
        desk: &DeskConfig,
        measure: &str,
        params: &ResolvedParams,
        at: &JobTimestamp,
    ) -> Result<FetchedMeasure> {
        match self {
            Self::Predicate(source) => source.fetch_measure(desk, measure, params),
            Self::Keyed(source) => source.fetch_measure(desk, measure, params, at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exposure_core::table::Cell;

    #[test]
    fn test_measure_fetch_classification() {
        let empty = MeasureFetch::from_table(ExposureTable::new(["Currency"]));
        assert!(empty.is_empty());

        let populated = MeasureFetch::from_table(
            ExposureTable::with_rows(["Currency"], vec![vec![Cell::from("USD")]]).unwrap(),
        );
        assert!(!populated.is_empty());
        assert_eq!(populated.num_rows(), 1);

        let suppressed = populated.suppressed();
        assert!(suppressed.is_empty());
        assert_eq!(suppressed.table().columns(), ["Currency"]);
    }
}
