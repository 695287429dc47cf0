//! Top-level (desk, source) aggregation.

use crate::aggregator::ExposureAggregator;
use crate::tracker::MissingMeasureTracker;
use exposure_core::catalog::SourceCatalog;
use exposure_core::desk::DeskConfig;
use exposure_core::envelope::ResultEnvelope;
use exposure_core::suppression::SuppressionRules;
use exposure_core::table::{ExposureTable, MeasureSnapshot};
use exposure_core::timestamp::JobTimestamp;
use exposure_core::Result;
use exposure_sources::{FetchedMeasure, Fetchers, SourceAdapter};
use std::fmt;
use tracing::{debug, info, info_span, warn};

static NO_SUPPRESSIONS: SuppressionRules = SuppressionRules::new();

/// How complete one run's data was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalState {
    /// No measure missing
    FullyPopulated,
    /// Some, but not all, measures missing
    PartiallyPopulated,
    /// Every expected measure missing (whole-source unavailability)
    FullyEmpty,
}

impl TerminalState {
    /// Get the name of this state.
    pub fn name(&self) -> &'static str {
        match self {
            TerminalState::FullyPopulated => "fully populated",
            TerminalState::PartiallyPopulated => "partially populated",
            TerminalState::FullyEmpty => "fully empty",
        }
    }
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything one (desk, source) invocation produces.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationOutcome {
    /// Raw table per expected measure, empty ones included
    pub snapshots: MeasureSnapshot,
    /// Row-wise union of the populated measures, tagged by measure
    pub exposures: ExposureTable,
    /// Contract object for reporting and alerting
    pub envelope: ResultEnvelope,
}

impl AggregationOutcome {
    /// Completeness of the run.
    pub fn state(&self) -> TerminalState {
        let envelope = &self.envelope;
        let missing = &envelope.measures_missing_exposures;
        if missing.is_empty() {
            TerminalState::FullyPopulated
        } else if envelope.measure_names.iter().all(|m| missing.contains(m)) {
            TerminalState::FullyEmpty
        } else {
            TerminalState::PartiallyPopulated
        }
    }

    /// Desk display name.
    pub fn desk(&self) -> &str {
        &self.envelope.level
    }

    /// Source identifier.
    pub fn source(&self) -> &str {
        &self.envelope.source
    }

    /// Whether at least one measure produced rows.
    pub fn has_exposures(&self) -> bool {
        !self.exposures.is_empty()
    }
}

/// Drives the per-measure loop for one desk and one source.
///
/// Holds only shared, read-only inputs; all per-run state lives inside
/// [`aggregate`](Self::aggregate), so one orchestrator can serve many
/// concurrent invocations.
#[derive(Clone, Copy)]
pub struct AggregationOrchestrator<'a> {
    catalog: &'a SourceCatalog,
    fetchers: Fetchers<'a>,
    suppressions: &'a SuppressionRules,
}

impl<'a> AggregationOrchestrator<'a> {
    /// Orchestrator with no suppression rules.
    pub fn new(catalog: &'a SourceCatalog, fetchers: Fetchers<'a>) -> Self {
        Self {
            catalog,
            fetchers,
            suppressions: &NO_SUPPRESSIONS,
        }
    }

    /// Consult `suppressions` for every fetched measure.
    pub fn with_suppressions(mut self, suppressions: &'a SuppressionRules) -> Self {
        self.suppressions = suppressions;
        self
    }

    /// Catalog shared by every invocation.
    pub fn catalog(&self) -> &'a SourceCatalog {
        self.catalog
    }

    /// Aggregate every expected measure of `source_id` for `desk`.
    ///
    /// # Errors
    ///
    /// - `ExposureError::Configuration` when the source is not catalogued,
    ///   its catalog entry is malformed, or it is not a known source family.
    /// - `ExposureError::Fetch` when a collaborator raises; no envelope is
    ///   produced for the pair in that case.
    pub fn aggregate(
        &self,
        desk: &DeskConfig,
        source_id: &str,
        at: &JobTimestamp,
    ) -> Result<AggregationOutcome> {
        let span = info_span!("aggregate", desk = %desk.name, source = %source_id);
        let _enter = span.enter();

        let params = self.catalog.resolve(source_id)?;
        let adapter = SourceAdapter::select(source_id, desk, self.fetchers)?;

        let mut snapshots = MeasureSnapshot::new();
        let mut aggregator = ExposureAggregator::new();
        let mut tracker = MissingMeasureTracker::for_params(&params);

        for measure in params.measure_names() {
            let FetchedMeasure {
                mut snapshot,
                mut exposures,
            } = adapter.fetch_measure(desk, measure, &params, at)?;

            if self.suppressions.suppresses(&desk.name, source_id, measure) {
                debug!(measure = %measure, rows = exposures.num_rows(), "Measure suppressed by rule");
                snapshot = snapshot.empty_like();
                exposures = exposures.suppressed();
            }

            snapshots.insert(measure.as_str(), snapshot);
            aggregator = aggregator.push(exposures.table());

            if exposures.is_empty() {
                warn!(measure = %measure, "No exposures returned");
                tracker.record_missing(measure);
            } else {
                debug!(measure = %measure, rows = exposures.num_rows(), "Exposures collected");
            }
        }

        let outcome = AggregationOutcome {
            snapshots,
            exposures: aggregator.finish(),
            envelope: ResultEnvelope::new(params, desk.name.as_str(), tracker.into_record())
                .with_snapshot(at.window()),
        };

        info!(
            state = %outcome.state(),
            rows = outcome.exposures.num_rows(),
            missing = outcome.envelope.measures_missing_exposures.len(),
            window = %at.window().name(),
            "Aggregation complete"
        );

        Ok(outcome)
    }
}
