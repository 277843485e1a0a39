//! Packet capture configuration.
//!
//! Exactly one of `device` (live) or `file` (offline replay) selects where frames come from.

use std::path::PathBuf;

use pktswarm_capture::{CaptureOptions, CaptureSource};
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::error::ConfigError;
use crate::validation;

/// Packet capture configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Network device for live capture.
    #[validate(custom(function = validation::validate_interface))]
    pub device: Option<String>,

    /// pcap savefile to replay.
    pub file: Option<PathBuf>,

    /// BPF filter expression.
    #[validate(custom(function = validation::validate_filter))]
    pub filter: Option<String>,

    /// Bytes captured per frame.
    #[validate(range(min = 64, max = 262144))]
    pub snaplen: u32,

    /// Run in promiscuous mode?
    pub promiscuous: bool,

    /// Live read timeout (milliseconds).
    #[validate(range(min = 1, max = 60000))]
    pub read_timeout_ms: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            file: None,
            filter: None,
            snaplen: 65535,
            promiscuous: true,
            read_timeout_ms: 1000,
        }
    }
}

impl CaptureConfig {
    /// The single configured frame source.
    pub fn source(&self) -> Result<CaptureSource, ConfigError> {
        match (&self.device, &self.file) {
            (Some(_), Some(_)) => Err(ConfigError::SourceConflict),
            (Some(device), None) => Ok(CaptureSource::Live(device.clone())),
            (None, Some(file)) => Ok(CaptureSource::Offline(file.clone())),
            (None, None) => Err(ConfigError::MissingSource),
        }
    }

    pub fn options(&self) -> CaptureOptions {
        CaptureOptions {
            filter: self.filter.clone(),
            snaplen: i32::try_from(self.snaplen).unwrap_or(i32::MAX),
            promiscuous: self.promiscuous,
            read_timeout_ms: i32::try_from(self.read_timeout_ms).unwrap_or(i32::MAX),
        }
    }
}
