//! Collaborator-level fetch errors.

use thiserror::Error;

/// Failure raised by a fetch collaborator.
///
/// "No data" is never a `FetchError`; collaborators return an empty table
/// for that.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Backing store unreachable
    #[error("Connectivity failure: {0}")]
    Connectivity(String),

    /// Query rejected by the backing store
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored payload could not be decoded
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FetchError {
    /// Create a connectivity error
    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity(msg.into())
    }

    /// Create a malformed-query error
    pub fn malformed_query(msg: impl Into<String>) -> Self {
        Self::MalformedQuery(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::connectivity("ficc_reportresults unreachable");
        assert_eq!(err.to_string(), "Connectivity failure: ficc_reportresults unreachable");
    }
}
