//! Check command implementation
//!
//! Validates the job configuration without fetching anything.

use infra_config::{ConfigError, JobConfig};
use tracing::{error, info};

use crate::Result;

/// Run the check command
pub fn run(config: &JobConfig) -> Result<()> {
    info!("Checking job configuration...");

    match config.validate() {
        Ok(()) => {
            info!(
                sources = config.catalog.len(),
                desks = config.desks.len(),
                suppressions = config.suppressions.rules().len(),
                timezone = %config.timezone,
                "Configuration OK"
            );
            for desk in &config.desks {
                info!(desk = %desk.name, filter = %desk.filter(), sources = ?desk.sources, "Desk");
            }
            Ok(())
        }
        Err(e) => {
            if let ConfigError::Validation(problems) = &e {
                for problem in problems {
                    error!("{}", problem);
                }
            }
            Err(e.into())
        }
    }
}
