//! # pktswarm Configuration System
//!
//! Layered configuration for capture, reporting, flow tracking and telemetry.
//!
//! ## Layers (lowest priority first)
//! 1. Built-in defaults
//! 2. A YAML file: the one passed explicitly, else `config/pktswarm.yaml` when present
//! 3. `PKTSWARM_*` environment variables, `__` separating nested keys
//!    (`PKTSWARM_FLOW__TIMEOUT_SECS=30`)
//!
//! Command-line overrides are applied by the binary on top of the loaded value, followed by
//! another call to [`PktswarmConfig::check`].

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod capture;
mod error;
mod flow;
mod report;
mod telemetry;
mod validation;

pub use capture::CaptureConfig;
pub use error::ConfigError;
pub use flow::FlowConfig;
pub use report::ReportConfig;
pub use telemetry::TelemetryConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/pktswarm.yaml";
pub const ENV_PREFIX: &str = "PKTSWARM_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
#[serde(default)]
pub struct PktswarmConfig {
    #[validate(nested)]
    pub capture: CaptureConfig,

    #[validate(nested)]
    pub report: ReportConfig,

    #[validate(nested)]
    pub flow: FlowConfig,

    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl PktswarmConfig {
    /// Loads defaults, then `path` (or the default file if it exists), then the environment.
    ///
    /// An explicit `path` that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(PktswarmConfig::default()));

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(PathBuf::from(path)));
                }
                figment = figment.merge(Yaml::file(path));
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                figment = figment.merge(Yaml::file(DEFAULT_CONFIG_PATH));
            }
            None => {}
        }

        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extracts and checks a configuration from an assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.check()?;
        Ok(config)
    }

    /// Field rules plus the cross-field flow horizon rule.
    ///
    /// The capture source is not checked here since it is usually supplied on the command
    /// line; see [`CaptureConfig::source`].
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.flow.check_horizon()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn full_config_validation() {
        let config = PktswarmConfig::default();
        config.check().expect("Default config should validate");
    }

    #[test]
    fn defaults_match_documentation() {
        let config = PktswarmConfig::default();
        assert_eq!(config.capture.snaplen, 65535);
        assert!(config.capture.promiscuous);
        assert_eq!(config.report.interval_secs, 1.0);
        assert_eq!(config.report.handlers, ["BasicStats"]);
        assert!(!config.flow.enabled);
        assert_eq!(config.flow.timeout_secs, 5);
        assert_eq!(config.flow.slot_count, 3600);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn yaml_then_environment_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.yaml",
                "capture:\n  file: trace.pcap\n\
                 report:\n  interval_secs: 2.5\n  handlers: [BasicStats, SessionCount]\n\
                 flow:\n  enabled: true\n  timeout_secs: 10\n",
            )?;
            jail.set_env("PKTSWARM_FLOW__TIMEOUT_SECS", "30");

            let config =
                PktswarmConfig::load(Some(Path::new("custom.yaml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.capture.file, Some(PathBuf::from("trace.pcap")));
            assert_eq!(config.report.interval_secs, 2.5);
            assert_eq!(config.report.handlers, ["BasicStats", "SessionCount"]);
            assert!(config.flow.enabled);
            assert_eq!(config.flow.timeout_secs, 30);
            assert_eq!(config.flow.slot_count, 3600);
            Ok(())
        });
    }

    #[test]
    fn default_file_is_picked_up() {
        Jail::expect_with(|jail| {
            std::fs::create_dir_all("config").map_err(|e| e.to_string())?;
            jail.create_file(DEFAULT_CONFIG_PATH, "telemetry:\n  log_level: debug\n")?;

            let config = PktswarmConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.telemetry.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        Jail::expect_with(|_| {
            let err = PktswarmConfig::load(Some(Path::new("nope.yaml"))).unwrap_err();
            assert!(matches!(err, ConfigError::FileNotFound(_)));
            Ok(())
        });
    }

    #[test]
    fn horizon_rule_applies_on_load() {
        Jail::expect_with(|jail| {
            jail.set_env("PKTSWARM_FLOW__SLOT_COUNT", "16");
            jail.set_env("PKTSWARM_FLOW__TIMEOUT_SECS", "20");

            let err = PktswarmConfig::load(None).unwrap_err();
            assert!(matches!(err, ConfigError::FlowHorizon { .. }));
            Ok(())
        });
    }

    #[test]
    fn invalid_field_is_reported_by_name() {
        Jail::expect_with(|jail| {
            jail.set_env("PKTSWARM_TELEMETRY__LOG_LEVEL", "loud");

            let err = PktswarmConfig::load(None).unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)));
            assert!(err.to_string().contains("log_level"));
            Ok(())
        });
    }

    #[test]
    fn effective_config_dumps_as_yaml() {
        let yaml = serde_yaml::to_string(&PktswarmConfig::default()).unwrap();
        assert!(yaml.contains("interval_secs: 1.0"));
        assert!(yaml.contains("slot_count: 3600"));
    }
}
