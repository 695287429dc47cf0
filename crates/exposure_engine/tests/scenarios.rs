//! End-to-end aggregation scenarios: full and partial desk failure,
//! multi-source independence, intraday recovery and collaborator failure.

use approx::assert_relative_eq;
use chrono::TimeZone;
use chrono_tz::America::New_York;
use exposure_core::catalog::SourceCatalog;
use exposure_core::desk::{DeskConfig, DeskFilter};
use exposure_core::table::{Cell, ExposureTable, EXPOSURE_COL, MEASURE_COL};
use exposure_core::timestamp::{JobTimestamp, SnapshotWindow};
use exposure_core::ExposureError;
use exposure_engine::{
    consolidated_report, missing_exposure_alerts, run_batch, AggregationOrchestrator,
    BatchSummary, TerminalState,
};
use exposure_sources::{
    FetchError, Fetchers, FixtureRecord, FixtureStore, PredicateFetcher, QuerySpec,
};
use proptest::prelude::*;
use serde_json::json;

const AMRS: &str = "AMRS";
const GNLR: &str = "GLOBAL NON-LINEAR-AMRS STRUCTURED RATES";

fn catalog() -> SourceCatalog {
    serde_json::from_value(json!({
        "cirt_rra": [
            { "measure_names": ["A", "B", "C"] },
            { "calc_level": ["VTD+Currency"] },
        ],
        "management_rra": [
            { "measure_names": ["IR Delta", "Vega"] },
            { "measure_name_overrides": { "IR Delta": "IR01" } },
        ],
        "legacy": [
            { "measure_names": ["IR Delta", "Vega"] },
            { "legacy_db": "ficc_reportresults" },
        ]
    }))
    .unwrap()
}

fn desk(name: &str) -> DeskConfig {
    DeskConfig::new(name)
        .with_field("VolckerBusinessArea", "GLOBAL RATES")
        .with_field("VolckerTradingDesk", name)
}

fn at(hour: u32) -> JobTimestamp {
    JobTimestamp::new(New_York.with_ymd_and_hms(2025, 9, 2, hour, 15, 0).unwrap())
}

fn rows(value_col: &str, n: usize) -> ExposureTable {
    let cells = (0..n)
        .map(|i| vec![Cell::from("USD"), Cell::from(100.0 * (i + 1) as f64)])
        .collect();
    ExposureTable::with_rows(["Currency", value_col], cells).unwrap()
}

fn predicate_record(source: &str, desk: &str, measure: &str, n: usize) -> FixtureRecord {
    FixtureRecord {
        source: source.to_string(),
        desk: desk.to_string(),
        measure: measure.to_string(),
        hour: None,
        table: rows(&format!("{measure}_USD"), n),
    }
}

fn keyed_record(desk: &str, measure: &str, hour: Option<u32>, n: usize) -> FixtureRecord {
    FixtureRecord {
        source: "legacy".to_string(),
        desk: desk.to_string(),
        measure: measure.to_string(),
        hour,
        table: rows(EXPOSURE_COL, n),
    }
}

fn missing_keys(outcome: &exposure_engine::AggregationOutcome) -> Vec<&str> {
    outcome.envelope.measures_missing_exposures.keys().collect()
}

#[test]
fn test_partial_desk_failure() {
    let catalog = catalog();
    let store = FixtureStore::new().with_record(predicate_record("cirt_rra", AMRS, "C", 3));
    let orchestrator = AggregationOrchestrator::new(&catalog, Fetchers::single(&store));

    let outcome = orchestrator.aggregate(&desk(AMRS), "cirt_rra", &at(17)).unwrap();

    assert_eq!(outcome.snapshots.len(), 3);
    assert!(outcome.snapshots.get("A").unwrap().is_empty());
    assert!(outcome.snapshots.get("B").unwrap().is_empty());
    assert_eq!(outcome.snapshots.get("C").unwrap().num_rows(), 3);

    assert_eq!(outcome.exposures.num_rows(), 3);
    assert!(outcome
        .exposures
        .column(MEASURE_COL)
        .all(|c| c.as_str() == Some("C")));

    assert_eq!(missing_keys(&outcome), vec!["A", "B"]);
    let missing = &outcome.envelope.measures_missing_exposures;
    assert_eq!(missing.sources_for("A"), Some(&["cirt_rra".to_string()][..]));
    assert_eq!(missing.sources_for("B"), Some(&["cirt_rra".to_string()][..]));
    assert_eq!(outcome.state(), TerminalState::PartiallyPopulated);
}

#[test]
fn test_full_desk_failure() {
    let catalog = catalog();
    let store = FixtureStore::new();
    let orchestrator = AggregationOrchestrator::new(&catalog, Fetchers::single(&store));

    let outcome = orchestrator.aggregate(&desk(AMRS), "cirt_rra", &at(17)).unwrap();

    assert_eq!(outcome.snapshots.len(), 3);
    assert!(outcome.exposures.is_empty());
    assert_eq!(missing_keys(&outcome), vec!["A", "B", "C"]);
    assert!(outcome
        .envelope
        .measures_missing_exposures
        .iter()
        .all(|(_, sources)| sources == ["cirt_rra".to_string()]));
    assert_eq!(outcome.state(), TerminalState::FullyEmpty);
}

#[test]
fn test_envelope_source_survives_name_overrides() {
    let catalog = catalog();
    let store = FixtureStore::new()
        .with_record(predicate_record("management_rra", AMRS, "IR01", 2))
        .with_record(predicate_record("management_rra", AMRS, "Vega", 1));
    let orchestrator = AggregationOrchestrator::new(&catalog, Fetchers::single(&store));

    let outcome = orchestrator.aggregate(&desk(AMRS), "management_rra", &at(17)).unwrap();

    assert_eq!(outcome.source(), "management_rra");
    assert_eq!(outcome.state(), TerminalState::FullyPopulated);
    assert_eq!(outcome.exposures.num_rows(), 3);

    let tags: Vec<_> = outcome
        .exposures
        .column(MEASURE_COL)
        .filter_map(Cell::as_str)
        .collect();
    assert_eq!(tags, vec!["IR Delta", "IR Delta", "Vega"]);
    assert_relative_eq!(outcome.exposures.sum_column(EXPOSURE_COL), 400.0);
}

#[test]
fn test_cross_source_envelopes_stay_independent() {
    let catalog = catalog();
    let store = FixtureStore::new()
        .with_record(keyed_record(GNLR, "Vega", None, 2))
        .with_record(predicate_record("management_rra", GNLR, "IR01", 1));
    let orchestrator = AggregationOrchestrator::new(&catalog, Fetchers::single(&store));
    let desks = vec![desk(GNLR).with_source("legacy").with_source("management_rra")];

    let results = run_batch(&orchestrator, &desks, &at(17));
    assert_eq!(results.len(), 2);

    let legacy = results[0].outcome().unwrap();
    assert_eq!(results[0].source, "legacy");
    assert_eq!(missing_keys(legacy), vec!["IR Delta"]);
    assert_eq!(
        legacy.envelope.measures_missing_exposures.sources_for("IR Delta"),
        Some(&["legacy".to_string()][..])
    );

    let cirt = results[1].outcome().unwrap();
    assert_eq!(results[1].source, "management_rra");
    assert_eq!(missing_keys(cirt), vec!["Vega"]);
    assert_eq!(
        cirt.envelope.measures_missing_exposures.sources_for("Vega"),
        Some(&["management_rra".to_string()][..])
    );

    let envelopes: Vec<_> = results
        .iter()
        .filter_map(|r| r.outcome().map(|o| &o.envelope))
        .collect();
    let alerts = missing_exposure_alerts(envelopes);
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].lines, vec!["IR Delta missing from [legacy] datasource".to_string()]);
    assert_eq!(
        alerts[1].lines,
        vec!["Vega missing from [management_rra] datasource".to_string()]
    );
}

#[test]
fn test_intraday_recovery_carries_no_state() {
    let catalog = catalog();
    let store = FixtureStore::new()
        .with_record(keyed_record(GNLR, "IR Delta", None, 1))
        .with_record(keyed_record(GNLR, "Vega", Some(17), 2));
    let orchestrator = AggregationOrchestrator::new(&catalog, Fetchers::single(&store));
    let gnlr = desk(GNLR);

    let first = orchestrator.aggregate(&gnlr, "legacy", &at(9)).unwrap();
    let close = orchestrator.aggregate(&gnlr, "legacy", &at(17)).unwrap();

    assert_eq!(first.envelope.snapshot, Some(SnapshotWindow::First));
    assert!(first.envelope.measures_missing_exposures.contains("Vega"));
    assert_eq!(first.state(), TerminalState::PartiallyPopulated);

    assert_eq!(close.envelope.snapshot, Some(SnapshotWindow::Close));
    assert!(!close.envelope.has_missing());
    assert_eq!(close.exposures.num_rows(), 3);

    let first_again = orchestrator.aggregate(&gnlr, "legacy", &at(9)).unwrap();
    assert_eq!(first_again, first);
}

#[test]
fn test_rerun_is_idempotent() {
    let catalog = catalog();
    let store = FixtureStore::new().with_record(predicate_record("cirt_rra", AMRS, "B", 2));
    let orchestrator = AggregationOrchestrator::new(&catalog, Fetchers::single(&store));

    let first = orchestrator.aggregate(&desk(AMRS), "cirt_rra", &at(17)).unwrap();
    let second = orchestrator.aggregate(&desk(AMRS), "cirt_rra", &at(17)).unwrap();

    assert_eq!(first.envelope, second.envelope);
    assert_eq!(first, second);
}

#[test]
fn test_unknown_source_is_configuration_error() {
    let mut catalog = catalog();
    catalog.insert(
        "bloomberg",
        vec![json!({ "measure_names": ["A"] }).as_object().unwrap().clone()],
    );
    let store = FixtureStore::new();
    let orchestrator = AggregationOrchestrator::new(&catalog, Fetchers::single(&store));

    let uncatalogued = orchestrator.aggregate(&desk(AMRS), "murex", &at(17)).unwrap_err();
    assert!(uncatalogued.is_configuration());

    let no_adapter = orchestrator.aggregate(&desk(AMRS), "bloomberg", &at(17)).unwrap_err();
    assert!(no_adapter.is_configuration());
}

struct FlakyPredicate;

impl PredicateFetcher for FlakyPredicate {
    fn fetch(&self, query: &QuerySpec, _: &DeskFilter) -> Result<ExposureTable, FetchError> {
        if query.source_measure == "B" {
            Err(FetchError::connectivity("connection reset"))
        } else {
            Ok(ExposureTable::default())
        }
    }
}

#[test]
fn test_fetch_failure_yields_no_envelope() {
    let catalog = catalog();
    let store = FixtureStore::new().with_record(keyed_record(AMRS, "Vega", None, 1));
    let fetchers = Fetchers::new(&FlakyPredicate, &store);
    let orchestrator = AggregationOrchestrator::new(&catalog, fetchers);
    let desks = vec![desk(AMRS).with_source("cirt_rra").with_source("legacy")];

    let results = run_batch(&orchestrator, &desks, &at(17));

    match &results[0].result {
        Err(ExposureError::Fetch { source_id, measure, .. }) => {
            assert_eq!(source_id, "cirt_rra");
            assert_eq!(measure, "B");
        }
        other => panic!("Expected fetch failure, got {other:?}"),
    }
    assert!(results[1].outcome().is_some());

    let summary = BatchSummary::from_results(&results);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.partially_populated, 1);
    assert!(summary.has_failures());
}

#[test]
fn test_report_excludes_fully_empty_desks() {
    let catalog = catalog();
    let store = FixtureStore::new().with_record(predicate_record("cirt_rra", AMRS, "A", 1));
    let orchestrator = AggregationOrchestrator::new(&catalog, Fetchers::single(&store));
    let desks = vec![
        desk(AMRS).with_source("cirt_rra"),
        desk("EMEA").with_source("cirt_rra"),
    ];

    let results = run_batch(&orchestrator, &desks, &at(17));
    let outcomes: Vec<_> = results.iter().filter_map(|r| r.outcome()).collect();
    let report = consolidated_report(outcomes.iter().copied()).unwrap();

    assert_eq!(report.desks, vec![AMRS.to_string()]);
    assert_eq!(report.attachments.len(), 1);
    assert!(report.attachments[0].csv.starts_with("Currency,Exposures_USD,Measure\n"));

    let alerts = missing_exposure_alerts(outcomes.iter().map(|o| &o.envelope));
    assert_eq!(alerts.len(), 2);
    assert_eq!(
        alerts[1].subject,
        "[Error][Action Required] MissingExposures: EMEA measures A, B, C"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_missing_iff_empty(counts in proptest::collection::vec(0usize..4, 3)) {
        let catalog = catalog();
        let mut store = FixtureStore::new();
        for (measure, n) in ["A", "B", "C"].iter().zip(&counts) {
            if *n > 0 {
                store.push(predicate_record("cirt_rra", AMRS, measure, *n));
            }
        }
        let orchestrator = AggregationOrchestrator::new(&catalog, Fetchers::single(&store));

        let outcome = orchestrator.aggregate(&desk(AMRS), "cirt_rra", &at(17)).unwrap();
        let missing = &outcome.envelope.measures_missing_exposures;

        prop_assert_eq!(outcome.snapshots.len(), 3);
        for (measure, n) in ["A", "B", "C"].iter().zip(&counts) {
            prop_assert!(outcome.snapshots.contains(measure));
            prop_assert_eq!(outcome.snapshots.get(measure).unwrap().num_rows(), *n);
            prop_assert_eq!(missing.contains(measure), *n == 0);
        }

        prop_assert_eq!(outcome.exposures.num_rows(), counts.iter().sum::<usize>());
        prop_assert!(outcome
            .exposures
            .column(MEASURE_COL)
            .all(|c| matches!(c.as_str(), Some("A" | "B" | "C"))));

        if counts.iter().all(|n| *n == 0) {
            prop_assert_eq!(missing.len(), 3);
            prop_assert_eq!(outcome.state(), TerminalState::FullyEmpty);
        }
        if counts.iter().all(|n| *n > 0) {
            prop_assert!(missing.is_empty());
            prop_assert_eq!(outcome.state(), TerminalState::FullyPopulated);
        }

        let again = orchestrator.aggregate(&desk(AMRS), "cirt_rra", &at(17)).unwrap();
        prop_assert_eq!(&again.envelope, &outcome.envelope);
    }
}
