//! CLI error type.

use exposure_core::ExposureError;
use exposure_engine::ReportError;
use exposure_sources::FetchError;
use infra_config::ConfigError;
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Job configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Aggregation setup failed (e.g. an unparseable job timestamp)
    #[error(transparent)]
    Exposure(#[from] ExposureError),

    /// Fixture file could not be read
    #[error("Fixture error: {0}")]
    Fixtures(#[from] FetchError),

    /// Report artefacts could not be rendered
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Envelope serialisation failed
    #[error("Serialisation error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output could not be written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid command-line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Some desk/source pairs produced no envelope
    #[error("{0} desk/source pair(s) failed; see log for details")]
    PairsFailed(usize),
}

/// CLI result type
pub type Result<T> = std::result::Result<T, CliError>;
