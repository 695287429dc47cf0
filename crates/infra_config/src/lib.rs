//! # Infra Config
//!
//! Job configuration for exposure aggregation runs.
//!
//! Loads the source catalog, desk list and suppression rules from a TOML
//! file, applies `EXPOSURE_*` environment overrides and validates the
//! result, collecting every problem rather than stopping at the first.
//!
//! ```toml
//! log_level = "info"
//! output_dir = "reports"
//! timezone = "America/New_York"
//!
//! [catalog]
//! legacy = [{ measure_names = ["IR Delta", "IR Vega"] }]
//!
//! [[desks]]
//! name = "AMRS LINEAR RATES"
//! sources = ["legacy"]
//! ```

mod config;
mod error;

pub use config::{JobConfig, VALID_LOG_LEVELS};
pub use error::ConfigError;
