//! Flow tracking configuration.
//!
//! The timing wheel spans `slot_count * slot_duration_ms`; the flow timeout plus one slot
//! must fit inside it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(default)]
pub struct FlowConfig {
    /// Track per-connection state in the flow table?
    pub enabled: bool,

    /// Idle time before a flow is evicted (seconds).
    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    #[validate(range(min = 16, max = 1048576))]
    pub slot_count: usize,

    #[validate(range(min = 1))]
    pub slot_duration_ms: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: 5,
            slot_count: 3600,
            slot_duration_ms: 1000,
        }
    }
}

impl FlowConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn slot_duration(&self) -> Duration {
        Duration::from_millis(self.slot_duration_ms)
    }

    /// Checks that the timeout fits the wheel.
    pub fn check_horizon(&self) -> Result<(), ConfigError> {
        let timeout_ms = u128::from(self.timeout_secs) * 1000;
        let slot_ms = u128::from(self.slot_duration_ms);
        let horizon_ms = slot_ms * self.slot_count as u128;
        if timeout_ms + slot_ms > horizon_ms {
            return Err(ConfigError::FlowHorizon {
                timeout_ms,
                slot_ms,
                horizon_ms,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fits_horizon() {
        let config = FlowConfig::default();
        config.validate().unwrap();
        config.check_horizon().unwrap();
    }

    #[test]
    fn timeout_past_horizon_is_rejected() {
        let config = FlowConfig {
            timeout_secs: 16,
            slot_count: 16,
            slot_duration_ms: 1000,
            ..FlowConfig::default()
        };
        assert!(matches!(
            config.check_horizon(),
            Err(ConfigError::FlowHorizon { horizon_ms: 16000, .. })
        ));

        let config = FlowConfig {
            timeout_secs: 15,
            ..config
        };
        assert!(config.check_horizon().is_ok());
    }
}
