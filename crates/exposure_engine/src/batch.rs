//! Parallel fan-out over every (desk, source) pair of a job.
//!
//! Pairs share the catalog and fetch collaborators by reference and nothing
//! else, so no locking is needed.

use crate::orchestrator::{AggregationOrchestrator, AggregationOutcome, TerminalState};
use exposure_core::desk::DeskConfig;
use exposure_core::timestamp::JobTimestamp;
use exposure_core::Result;
use rayon::prelude::*;
use tracing::{error, info};

/// Result of one (desk, source) invocation.
///
/// A failed pair carries its error and produces no envelope; callers must
/// not confuse it with an envelope whose measures are all missing.
#[derive(Debug)]
pub struct PairResult {
    /// Desk display name
    pub desk: String,
    /// Source identifier
    pub source: String,
    /// Outcome, or the error that aborted the pair
    pub result: Result<AggregationOutcome>,
}

impl PairResult {
    /// Outcome if the pair succeeded.
    pub fn outcome(&self) -> Option<&AggregationOutcome> {
        self.result.as_ref().ok()
    }
}

/// Every (desk, source) pair, in desk order then source order.
pub fn job_pairs(desks: &[DeskConfig]) -> Vec<(&DeskConfig, &str)> {
    desks
        .iter()
        .flat_map(|desk| desk.sources.iter().map(move |s| (desk, s.as_str())))
        .collect()
}

/// Aggregate every pair of `desks` in parallel.
///
/// Results come back in [`job_pairs`] order regardless of scheduling.
pub fn run_batch(
    orchestrator: &AggregationOrchestrator<'_>,
    desks: &[DeskConfig],
    at: &JobTimestamp,
) -> Vec<PairResult> {
    let pairs = job_pairs(desks);
    info!(pairs = pairs.len(), at = %at, "Starting batch");

    pairs
        .par_iter()
        .map(|(desk, source)| {
            let result = orchestrator.aggregate(desk, source, at);
            if let Err(e) = &result {
                error!(desk = %desk.name, source = %source, error = %e, "Aggregation failed");
            }
            PairResult {
                desk: desk.name.clone(),
                source: source.to_string(),
                result,
            }
        })
        .collect()
}

/// Counts of batch outcomes by terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Pairs with every measure populated
    pub fully_populated: usize,
    /// Pairs with some measures missing
    pub partially_populated: usize,
    /// Pairs with every measure missing
    pub fully_empty: usize,
    /// Pairs aborted by an error
    pub failed: usize,
}

impl BatchSummary {
    /// Tally a batch.
    pub fn from_results(results: &[PairResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, pair| {
            match pair.result.as_ref().map(AggregationOutcome::state) {
                Ok(TerminalState::FullyPopulated) => summary.fully_populated += 1,
                Ok(TerminalState::PartiallyPopulated) => summary.partially_populated += 1,
                Ok(TerminalState::FullyEmpty) => summary.fully_empty += 1,
                Err(_) => summary.failed += 1,
            }
            summary
        })
    }

    /// Total pairs.
    pub fn total(&self) -> usize {
        self.fully_populated + self.partially_populated + self.fully_empty + self.failed
    }

    /// Whether any pair failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
