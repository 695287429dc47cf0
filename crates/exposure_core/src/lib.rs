//! # Exposure Core
//!
//! Data model shared by every layer of the exposure aggregation workspace.
//!
//! ## Modules
//!
//! - [`table`]: `ExposureTable` (row-wise tabular result) and `MeasureSnapshot`
//! - [`desk`]: `DeskConfig` and the `DeskFilter` row predicate
//! - [`catalog`]: `SourceCatalog` and the merged `ResolvedParams`
//! - [`envelope`]: `MissingExposureRecord` and `ResultEnvelope`
//! - [`suppression`]: declarative per-desk/measure suppression rules
//! - [`timestamp`]: `JobTimestamp` and `SnapshotWindow`
//! - [`error`]: `ExposureError`
//!
//! ## Example
//!
//! ```
//! use exposure_core::catalog::SourceCatalog;
//! use serde_json::json;
//!
//! let catalog: SourceCatalog = serde_json::from_value(json!({
//!     "legacy": [
//!         { "measure_names": ["IR Delta", "IR Vega"] },
//!         { "measure_name_overrides": [{ "IR Delta": "CFTC-IRDelta" }] },
//!     ]
//! }))
//! .unwrap();
//!
//! let params = catalog.resolve("legacy").unwrap();
//! assert_eq!(params.source(), "legacy");
//! assert_eq!(params.measure_names(), ["IR Delta", "IR Vega"]);
//! assert_eq!(params.source_measure_name("IR Delta"), "CFTC-IRDelta");
//! assert_eq!(params.source_measure_name("IR Vega"), "IR Vega");
//! ```

pub mod catalog;
pub mod desk;
pub mod envelope;
pub mod error;
pub mod suppression;
pub mod table;
pub mod timestamp;

pub use error::{ExposureError, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::{FieldGroup, ResolvedParams, SourceCatalog};
    pub use crate::desk::{DeskConfig, DeskFilter, FilterClause};
    pub use crate::envelope::{MissingExposureRecord, ResultEnvelope};
    pub use crate::error::{ExposureError, Result};
    pub use crate::suppression::{SuppressionRule, SuppressionRules};
    pub use crate::table::{Cell, ExposureTable, MeasureSnapshot, EXPOSURE_COL, MEASURE_COL};
    pub use crate::timestamp::{JobTimestamp, SnapshotWindow};
}
