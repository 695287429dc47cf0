//! Predicate-source adapter.

use crate::query::QuerySpec;
use crate::{FetchedMeasure, MeasureFetch, PredicateFetcher};
use exposure_core::catalog::ResolvedParams;
use exposure_core::desk::{DeskConfig, DeskFilter};
use exposure_core::table::{EXPOSURE_COL, MEASURE_COL};
use exposure_core::{ExposureError, Result};
use tracing::debug;

/// Suffix of the value column a predicate store returns per measure.
pub const VALUE_COL_SUFFIX: &str = "_USD";

/// Fetches measures from a store queried by business-hierarchy predicate.
pub struct PredicateSource<'a> {
    fetcher: &'a dyn PredicateFetcher,
    filter: DeskFilter,
}

impl<'a> PredicateSource<'a> {
    /// Build the adapter and the desk's filter.
    pub fn new(fetcher: &'a dyn PredicateFetcher, desk: &DeskConfig) -> Self {
        Self {
            fetcher,
            filter: desk.filter(),
        }
    }

    /// Row predicate used for every measure of this run.
    pub fn filter(&self) -> &DeskFilter {
        &self.filter
    }

    /// Fetch one measure.
    ///
    /// The `<source-local name>_USD` column is renamed to the canonical
    /// exposure column and every row is tagged with the canonical measure
    /// name. An empty read keeps its schema and is not an error.
    pub fn fetch_measure(
        &self,
        desk: &DeskConfig,
        measure: &str,
        params: &ResolvedParams,
    ) -> Result<FetchedMeasure> {
        let query = QuerySpec::predicate(desk, measure, params);
        let raw = self
            .fetcher
            .fetch(&query, &self.filter)
            .map_err(|e| ExposureError::fetch(params.source(), measure, e))?;

        let value_col = format!("{}{}", query.source_measure, VALUE_COL_SUFFIX);
        let snapshot = raw.rename_column(&value_col, EXPOSURE_COL);
        let tagged = snapshot.clone().extend_const(measure, MEASURE_COL);

        debug!(
            desk = %desk.name,
            source = %params.source(),
            measure = %measure,
            rows = tagged.num_rows(),
            filter = %self.filter,
            "Predicate fetch complete"
        );

        Ok(FetchedMeasure {
            snapshot,
            exposures: MeasureFetch::from_table(tagged),
        })
    }
}
