//! Composition of the downstream report and missing-exposure alerts.
//!
//! Only the content is built here. Delivery (email, file drop) belongs to
//! the caller.

use crate::orchestrator::AggregationOutcome;
use exposure_core::envelope::{MissingExposureRecord, ResultEnvelope};
use exposure_core::table::ExposureTable;
use serde::Serialize;
use thiserror::Error;

/// Subject prefix of every missing-exposure alert.
pub const ALERT_SUBJECT_PREFIX: &str = "[Error][Action Required] MissingExposures";

/// Subject of the consolidated report.
pub const REPORT_SUBJECT: &str = "EOD limit based check";

/// Errors raised while rendering report artefacts.
#[derive(Debug, Error)]
pub enum ReportError {
    /// CSV encoding failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV buffer could not be recovered from the writer
    #[error("CSV buffer error: {0}")]
    Buffer(String),

    /// Rendered CSV was not valid UTF-8
    #[error("CSV encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One alert per (desk, source) envelope with missing measures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingExposureAlert {
    /// Desk display name
    pub desk: String,
    /// Source the envelope came from
    pub source: String,
    /// Alert subject line
    pub subject: String,
    /// One line per missing measure, naming its source
    pub lines: Vec<String>,
}

impl MissingExposureAlert {
    /// Alert for `envelope`, or `None` when nothing is missing.
    pub fn from_envelope(envelope: &ResultEnvelope) -> Option<Self> {
        if !envelope.has_missing() {
            return None;
        }

        let missing = &envelope.measures_missing_exposures;
        let ordered = envelope.missing_in_order();
        let lines = ordered
            .iter()
            .map(|key| MissingExposureRecord::describe(key, missing.sources_for(key).unwrap_or_default()))
            .collect();

        Some(Self {
            desk: envelope.level.clone(),
            source: envelope.source.clone(),
            subject: format!(
                "{}: {} measures {}",
                ALERT_SUBJECT_PREFIX,
                envelope.level,
                ordered.join(", ")
            ),
            lines,
        })
    }

    /// Plain-text body.
    pub fn body(&self) -> String {
        let mut body = format!(
            "Exposures are missing for desk {} from source {}:\n\n",
            self.desk, self.source
        );
        for line in &self.lines {
            body.push_str("  - ");
            body.push_str(line);
            body.push('\n');
        }
        body
    }
}

/// Alerts for every envelope that has missing measures, in input order.
pub fn missing_exposure_alerts<'a, I>(envelopes: I) -> Vec<MissingExposureAlert>
where
    I: IntoIterator<Item = &'a ResultEnvelope>,
{
    envelopes
        .into_iter()
        .filter_map(MissingExposureAlert::from_envelope)
        .collect()
}

/// Exposure table of one (desk, source) pair, rendered as CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportAttachment {
    /// Desk display name
    pub desk: String,
    /// Source identifier
    pub source: String,
    /// CSV text, header row first
    pub csv: String,
}

/// One report per run covering the desks that have data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedReport {
    /// Report subject
    pub subject: String,
    /// Desks with at least one populated measure, first-seen order
    pub desks: Vec<String>,
    /// One attachment per pair with rows
    pub attachments: Vec<ReportAttachment>,
}

impl ConsolidatedReport {
    /// Whether no desk had any data.
    pub fn is_empty(&self) -> bool {
        self.desks.is_empty()
    }

    /// Plain-text summary listing the included desks.
    pub fn summary(&self) -> String {
        let mut text = format!("{} ({} desks)\n\n", self.subject, self.desks.len());
        for desk in &self.desks {
            text.push_str(desk);
            text.push('\n');
        }
        text
    }
}

/// Build the consolidated report from a run's outcomes.
///
/// Desks whose every pair is fully empty are left out.
pub fn consolidated_report<'a, I>(outcomes: I) -> Result<ConsolidatedReport, ReportError>
where
    I: IntoIterator<Item = &'a AggregationOutcome>,
{
    let mut desks: Vec<String> = Vec::new();
    let mut attachments = Vec::new();

    for outcome in outcomes.into_iter().filter(|o| o.has_exposures()) {
        if !desks.iter().any(|d| d == outcome.desk()) {
            desks.push(outcome.desk().to_string());
        }
        attachments.push(ReportAttachment {
            desk: outcome.desk().to_string(),
            source: outcome.source().to_string(),
            csv: render_csv(&outcome.exposures)?,
        });
    }

    Ok(ConsolidatedReport {
        subject: REPORT_SUBJECT.to_string(),
        desks,
        attachments,
    })
}

/// Render a table as CSV with a header row.
pub fn render_csv(table: &ExposureTable) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Buffer(e.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
