//! # Exposure Engine
//!
//! Aggregates one desk's regulatory exposure measures from one backing
//! source and tracks which expected measures failed to produce rows.
//!
//! ## Flow
//!
//! ```text
//! SourceCatalog ─► ResolvedParams ─► per-measure loop ─► SourceAdapter
//!                                          │
//!              ExposureAggregator ◄────────┼────────► MissingMeasureTracker
//!                                          ▼
//!                           (MeasureSnapshot, ExposureTable, ResultEnvelope)
//! ```
//!
//! Each invocation owns its tracker and accumulator, so independent
//! (desk, source) pairs can run concurrently through [`run_batch`] with the
//! catalog shared by reference.

pub mod aggregator;
pub mod alerts;
pub mod batch;
pub mod orchestrator;
pub mod tracker;

pub use aggregator::{concatenate, ExposureAggregator};
pub use alerts::{
    consolidated_report, missing_exposure_alerts, ConsolidatedReport, MissingExposureAlert,
    ReportAttachment, ReportError,
};
pub use batch::{job_pairs, run_batch, BatchSummary, PairResult};
pub use orchestrator::{AggregationOrchestrator, AggregationOutcome, TerminalState};
pub use tracker::MissingMeasureTracker;
