//! Error types for exposure aggregation.
//!
//! Only configuration and collaborator I/O failures are errors. A measure
//! that fetches zero rows is a normal outcome and never surfaces here.

use thiserror::Error;

/// Boxed collaborator error carried by [`ExposureError::Fetch`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort one (desk, source) aggregation.
#[derive(Debug, Error)]
pub enum ExposureError {
    /// Unknown source identifier or malformed catalog entry.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Row/column shape mismatch while building a table.
    #[error("Table schema error: {0}")]
    Schema(String),

    /// A fetch collaborator raised (connectivity, malformed query).
    #[error("Fetch failure for measure '{measure}' from source '{source_id}': {cause}")]
    Fetch {
        /// Source the fetch was issued against
        source_id: String,
        /// Canonical measure name
        measure: String,
        /// Underlying collaborator error
        #[source]
        cause: BoxError,
    },
}

impl ExposureError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Wrap a collaborator failure for `measure` fetched from `source_id`
    pub fn fetch(
        source_id: impl Into<String>,
        measure: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self::Fetch {
            source_id: source_id.into(),
            measure: measure.into(),
            cause: cause.into(),
        }
    }

    /// Whether this error is a configuration problem (as opposed to I/O).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Result alias used across the exposure crates.
pub type Result<T> = std::result::Result<T, ExposureError>;
