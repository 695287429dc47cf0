//! Job configuration management.
//!
//! Handles loading of the job configuration from TOML files with
//! environment variable override support.

use crate::error::ConfigError;
use chrono_tz::Tz;
use exposure_core::catalog::SourceCatalog;
use exposure_core::desk::DeskConfig;
use exposure_core::suppression::SuppressionRules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Log levels accepted by `log_level`.
pub const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory rendered envelopes, reports and alerts are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// IANA zone job timestamps are evaluated in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Recorded exposure tables served by the file-backed collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<PathBuf>,

    /// Source identifier -> field groups
    #[serde(default)]
    pub catalog: SourceCatalog,

    /// Desks to aggregate
    #[serde(default)]
    pub desks: Vec<DeskConfig>,

    /// Per-desk/measure suppression rules
    #[serde(default)]
    pub suppressions: SuppressionRules,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            output_dir: default_output_dir(),
            timezone: default_timezone(),
            fixtures: None,
            catalog: SourceCatalog::new(),
            desks: Vec::new(),
            suppressions: SuppressionRules::new(),
        }
    }
}

impl JobConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&content)?;
        info!(
            path = %path.display(),
            sources = config.catalog.len(),
            desks = config.desks.len(),
            "Job configuration loaded"
        );
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn with_env_override(mut self) -> Self {
        if let Ok(log_level) = std::env::var("EXPOSURE_LOG_LEVEL") {
            self.log_level = log_level;
        }

        if let Ok(output_dir) = std::env::var("EXPOSURE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(output_dir);
        }

        if let Ok(timezone) = std::env::var("EXPOSURE_TIMEZONE") {
            self.timezone = timezone;
        }

        if let Ok(fixtures) = std::env::var("EXPOSURE_FIXTURES") {
            self.fixtures = Some(PathBuf::from(fixtures));
        }

        self
    }

    /// Parsed job timezone
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ConfigError::Validation(vec![format!(
                "Invalid timezone '{}'. Must be an IANA zone name",
                self.timezone
            )])
        })
    }

    /// Desk by name
    pub fn desk(&self, name: &str) -> Option<&DeskConfig> {
        self.desks.iter().find(|d| d.name == name)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        // Validate log level
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log_level '{}'. Valid values: {:?}",
                self.log_level, VALID_LOG_LEVELS
            ));
        }

        if let Err(e) = self.tz() {
            errors.extend(e.problems().iter().cloned());
        }

        if self.output_dir.as_os_str().is_empty() {
            errors.push("output_dir cannot be empty".to_string());
        }

        // Every catalogued source must resolve
        errors.extend(self.catalog.validate());

        let mut names = BTreeSet::new();
        for (i, desk) in self.desks.iter().enumerate() {
            if desk.name.trim().is_empty() {
                errors.push(format!("desks[{}] has an empty name", i));
            } else if !names.insert(desk.name.as_str()) {
                errors.push(format!("Desk '{}' is configured more than once", desk.name));
            }

            if desk.sources.is_empty() {
                errors.push(format!("Desk '{}' lists no sources", desk.name));
            }
            for source in &desk.sources {
                if !self.catalog.contains(source) {
                    errors.push(format!(
                        "Desk '{}' references unknown source '{}'",
                        desk.name, source
                    ));
                }
            }
        }

        for rule in self.suppressions.rules() {
            if self.desk(&rule.desk).is_none() {
                errors.push(format!("Suppression rule references unknown desk '{}'", rule.desk));
            }
            if let Some(source) = &rule.source {
                if !self.catalog.contains(source) {
                    errors.push(format!(
                        "Suppression rule for desk '{}' references unknown source '{}'",
                        rule.desk, source
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load configuration from file and validate
    pub fn load_and_validate(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file with environment overrides and validate
    pub fn load_with_env_and_validate(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?.with_env_override();
        config.validate()?;
        Ok(config)
    }
}
