//! Run command implementation
//!
//! Aggregates every configured (desk, source) pair and writes the results:
//! one JSON envelope per successful pair, the consolidated report with its
//! CSV attachments, and one alert per pair with missing measures.

use exposure_core::desk::DeskConfig;
use exposure_core::timestamp::JobTimestamp;
use exposure_engine::{
    consolidated_report, missing_exposure_alerts, run_batch, AggregationOrchestrator,
    BatchSummary, PairResult,
};
use exposure_sources::{Fetchers, FixtureStore};
use infra_config::JobConfig;
use tracing::{info, warn};

use crate::sink::{ArtifactKind, FileWriter};
use crate::{CliError, Result};

/// Run the aggregation command
pub fn run(config: &JobConfig, at: Option<&str>, desk: Option<&str>) -> Result<()> {
    config.validate()?;

    let tz = config.tz()?;
    let at = match at {
        Some(s) => JobTimestamp::parse_rfc3339(s, tz)?,
        None => JobTimestamp::now(tz),
    };

    let desks = select_desks(config, desk)?;
    let store = load_fixtures(config)?;

    info!(
        at = %at,
        window = at.window().name(),
        desks = desks.len(),
        "Running exposure aggregation"
    );

    let orchestrator = AggregationOrchestrator::new(&config.catalog, Fetchers::single(&store))
        .with_suppressions(&config.suppressions);
    let results = run_batch(&orchestrator, &desks, &at);

    let mut sink = FileWriter::new(&config.output_dir, &at)?;
    write_artefacts(&mut sink, &results)?;

    let summary = BatchSummary::from_results(&results);
    info!(
        pairs = summary.total(),
        fully_populated = summary.fully_populated,
        partially_populated = summary.partially_populated,
        fully_empty = summary.fully_empty,
        failed = summary.failed,
        files = sink.written().len(),
        output_dir = %sink.output_dir().display(),
        "Run complete"
    );

    if summary.has_failures() {
        return Err(CliError::PairsFailed(summary.failed));
    }
    Ok(())
}

fn select_desks(config: &JobConfig, desk: Option<&str>) -> Result<Vec<DeskConfig>> {
    match desk {
        None => Ok(config.desks.clone()),
        Some(name) => config
            .desk(name)
            .cloned()
            .map(|d| vec![d])
            .ok_or_else(|| CliError::InvalidArgument(format!("Unknown desk: {}", name))),
    }
}

fn load_fixtures(config: &JobConfig) -> Result<FixtureStore> {
    match &config.fixtures {
        Some(path) => Ok(FixtureStore::load(path)?),
        None => {
            warn!("No fixtures configured; every measure will fetch empty");
            Ok(FixtureStore::new())
        }
    }
}

fn write_artefacts(sink: &mut FileWriter, results: &[PairResult]) -> Result<()> {
    let outcomes: Vec<_> = results.iter().filter_map(PairResult::outcome).collect();

    for outcome in &outcomes {
        let json = serde_json::to_string_pretty(&outcome.envelope)?;
        sink.write(ArtifactKind::Envelope, &[outcome.desk(), outcome.source()], &json)?;
    }

    let report = consolidated_report(outcomes.iter().copied())?;
    sink.write(ArtifactKind::Report, &[], &report.summary())?;
    for attachment in &report.attachments {
        sink.write(
            ArtifactKind::Attachment,
            &[attachment.desk.as_str(), attachment.source.as_str()],
            &attachment.csv,
        )?;
    }

    for alert in missing_exposure_alerts(outcomes.iter().map(|o| &o.envelope)) {
        warn!(subject = %alert.subject, "Missing exposures");
        let text = format!("Subject: {}\n\n{}", alert.subject, alert.body());
        sink.write(ArtifactKind::Alert, &[alert.desk.as_str(), alert.source.as_str()], &text)?;
    }

    Ok(())
}
