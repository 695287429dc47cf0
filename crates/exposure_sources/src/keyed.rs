//! Keyed-source adapter.

use crate::query::QuerySpec;
use crate::{FetchedMeasure, KeyedFetcher, MeasureFetch};
use exposure_core::catalog::ResolvedParams;
use exposure_core::desk::DeskConfig;
use exposure_core::table::MEASURE_COL;
use exposure_core::timestamp::JobTimestamp;
use exposure_core::{ExposureError, Result};
use tracing::debug;

/// Fetches measures from a store addressed by desk, measure and hour.
///
/// Holds no state between calls: the same measure fetched at a later hour
/// may legitimately return rows that an earlier call did not.
pub struct KeyedSource<'a> {
    fetcher: &'a dyn KeyedFetcher,
}

impl<'a> KeyedSource<'a> {
    /// Wrap a keyed collaborator.
    pub fn new(fetcher: &'a dyn KeyedFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch one measure for the job's local hour.
    pub fn fetch_measure(
        &self,
        desk: &DeskConfig,
        measure: &str,
        params: &ResolvedParams,
        at: &JobTimestamp,
    ) -> Result<FetchedMeasure> {
        let query = QuerySpec::keyed(desk, measure, params, at);
        let (snapshot, path) = self
            .fetcher
            .fetch(&query, at.hour())
            .map_err(|e| ExposureError::fetch(params.source(), measure, e))?;

        let tagged = snapshot.clone().extend_const(measure, MEASURE_COL);

        debug!(
            desk = %desk.name,
            source = %params.source(),
            measure = %measure,
            hour = at.hour(),
            rows = tagged.num_rows(),
            path = %path,
            "Keyed fetch complete"
        );

        Ok(FetchedMeasure {
            snapshot,
            exposures: MeasureFetch::from_table(tagged),
        })
    }
}
