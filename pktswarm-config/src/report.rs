//! Reporting cadence and handler selection.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Seconds between published messages (wall clock). Millisecond resolution at best.
    #[validate(range(min = 0.001, max = 86400.0))]
    pub interval_secs: f64,

    /// Handler names, in output order.
    #[validate(length(min = 1))]
    pub handlers: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1.0,
            handlers: vec!["BasicStats".into()],
        }
    }
}

impl ReportConfig {
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs).unwrap_or(Duration::from_secs(1))
    }
}
