//! Job timestamps.
//!
//! Keyed sources are addressed by the local hour of the job, so a timestamp
//! always carries its IANA zone.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ExposureError, Result};

/// Local hour at which the close-of-business snapshot starts.
pub const CLOSE_SNAPSHOT_HOUR: u32 = 12;

/// Which intraday snapshot a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotWindow {
    /// Early snapshot (before [`CLOSE_SNAPSHOT_HOUR`])
    First,
    /// Close-of-business snapshot
    Close,
}

impl SnapshotWindow {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Close => "close",
        }
    }
}

/// Point in time a job runs at, in the job's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTimestamp {
    at: DateTime<Tz>,
}

impl JobTimestamp {
    /// Wrap a zoned timestamp.
    pub fn new(at: DateTime<Tz>) -> Self {
        Self { at }
    }

    /// Convert a UTC instant into `tz`.
    pub fn from_utc(at: DateTime<Utc>, tz: Tz) -> Self {
        Self::new(at.with_timezone(&tz))
    }

    /// Current time in `tz`.
    pub fn now(tz: Tz) -> Self {
        Self::from_utc(Utc::now(), tz)
    }

    /// Parse an RFC 3339 timestamp and convert it into `tz`.
    pub fn parse_rfc3339(s: &str, tz: Tz) -> Result<Self> {
        let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| {
            ExposureError::configuration(format!("invalid job timestamp '{}': {}", s, e))
        })?;
        Ok(Self::new(parsed.with_timezone(&tz)))
    }

    /// Zoned timestamp.
    pub fn at(&self) -> DateTime<Tz> {
        self.at
    }

    /// Hour of day in the job's zone.
    pub fn hour(&self) -> u32 {
        self.at.hour()
    }

    /// IANA zone name, e.g. `America/New_York`.
    pub fn timezone_name(&self) -> &'static str {
        self.at.timezone().name()
    }

    /// Snapshot window this job belongs to.
    pub fn window(&self) -> SnapshotWindow {
        if self.hour() < CLOSE_SNAPSHOT_HOUR {
            SnapshotWindow::First
        } else {
            SnapshotWindow::Close
        }
    }
}

impl fmt::Display for JobTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.at.to_rfc3339(), self.timezone_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;
    use chrono_tz::Europe::London;

    #[test]
    fn test_hour_is_local_to_zone() {
        let utc = Utc.with_ymd_and_hms(2025, 9, 1, 13, 30, 0).unwrap();
        let ny = JobTimestamp::from_utc(utc, New_York);
        let ldn = JobTimestamp::from_utc(utc, London);

        assert_eq!(ny.hour(), 9);
        assert_eq!(ldn.hour(), 14);
        assert_eq!(ny.timezone_name(), "America/New_York");
    }

    #[test]
    fn test_window() {
        let first = JobTimestamp::new(New_York.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap());
        let close = JobTimestamp::new(New_York.with_ymd_and_hms(2025, 9, 1, 17, 0, 0).unwrap());

        assert_eq!(first.window(), SnapshotWindow::First);
        assert_eq!(close.window(), SnapshotWindow::Close);
        assert_eq!(close.window().name(), "close");
    }

    #[test]
    fn test_parse_rfc3339() {
        let ts = JobTimestamp::parse_rfc3339("2025-09-01T21:00:00Z", New_York).unwrap();
        assert_eq!(ts.hour(), 17);

        let err = JobTimestamp::parse_rfc3339("yesterday", New_York).unwrap_err();
        assert!(err.is_configuration());
    }
}
