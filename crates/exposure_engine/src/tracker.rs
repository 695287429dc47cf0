//! Missing-measure bookkeeping for one aggregation run.

use exposure_core::catalog::ResolvedParams;
use exposure_core::envelope::MissingExposureRecord;

/// Accumulates the measures that produced no rows during one run.
///
/// Scoped to a single (desk, source) invocation: it is created from the
/// run's parameters and consumed into the envelope at the end, so nothing
/// leaks between concurrent runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMeasureTracker {
    source: String,
    record: MissingExposureRecord,
}

impl MissingMeasureTracker {
    /// Tracker attributing gaps to `source`.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            record: MissingExposureRecord::new(),
        }
    }

    /// Tracker attributing gaps to the source of `params`.
    pub fn for_params(params: &ResolvedParams) -> Self {
        Self::new(params.source())
    }

    /// Source every recorded gap is attributed to.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Record `measure` as missing. Recording it again is a no-op in effect.
    pub fn record_missing(&mut self, measure: &str) {
        self.record.record(measure, self.source.as_str());
    }

    /// Record a caller-supplied description instead of a bare measure name.
    pub fn record_described(&mut self, description: impl Into<String>) {
        self.record.record(description, self.source.as_str());
    }

    /// Whether `key` has been recorded.
    pub fn is_missing(&self, key: &str) -> bool {
        self.record.contains(key)
    }

    /// Number of recorded gaps.
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// Whether nothing is missing so far.
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Gaps recorded so far.
    pub fn record(&self) -> &MissingExposureRecord {
        &self.record
    }

    /// Consume into the record carried by the envelope.
    pub fn into_record(self) -> MissingExposureRecord {
        self.record
    }
}
