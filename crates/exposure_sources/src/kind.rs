//! Closed set of source families.

use exposure_core::{ExposureError, Result};
use std::fmt;

/// Source identifiers served by the predicate adapter.
pub const PREDICATE_SOURCES: [&str; 2] = ["management_rra", "cirt_rra"];

/// Source identifier served by the keyed adapter.
pub const KEYED_SOURCE: &str = "legacy";

/// Source family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Queried with a row predicate
    Predicate,
    /// Queried with explicit key parameters
    Keyed,
}

impl SourceKind {
    /// Family of `source_id`.
    pub fn of(source_id: &str) -> Result<Self> {
        if PREDICATE_SOURCES.contains(&source_id) {
            Ok(Self::Predicate)
        } else if source_id == KEYED_SOURCE {
            Ok(Self::Keyed)
        } else {
            Err(ExposureError::configuration(format!(
                "no adapter for source '{}' (known: {}, {})",
                source_id,
                PREDICATE_SOURCES.join(", "),
                KEYED_SOURCE
            )))
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Predicate => "predicate",
            Self::Keyed => "keyed",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch() {
        assert_eq!(SourceKind::of("cirt_rra").unwrap(), SourceKind::Predicate);
        assert_eq!(SourceKind::of("management_rra").unwrap(), SourceKind::Predicate);
        assert_eq!(SourceKind::of("legacy").unwrap(), SourceKind::Keyed);
    }

    #[test]
    fn test_unknown_source_is_configuration_error() {
        let err = SourceKind::of("cirt_unified_screen").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("cirt_unified_screen"));
    }
}
