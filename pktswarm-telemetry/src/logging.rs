//! ## pktswarm-telemetry::logging
//! **Structured logging with `tracing`**
//!
//! Logs go to stderr so stdout stays free for the columnar report output. `RUST_LOG`, when
//! set, replaces the configured level.

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::TelemetryError;
use crate::metrics::MetricsRecorder;

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Fails if one is already installed.
    pub fn init(level: &str) -> Result<(), TelemetryError> {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
            )
            .with_writer(std::io::stderr)
            .with_thread_names(true)
            .try_init()
            .map_err(|e| TelemetryError::Subscriber(e.to_string()))
    }

    /// Logs the current counter values at `info`.
    pub fn log_metrics(metrics: &MetricsRecorder) {
        info!(
            packets = metrics.packets.get(),
            bytes = metrics.bytes.get(),
            flows_active = metrics.flows_active.get(),
            flows_expired = metrics.flows_expired.get(),
            messages = metrics.messages.get(),
            "Capture totals"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_metrics_logging() {
        let metrics = MetricsRecorder::new().unwrap();
        metrics.record_packet(60);
        metrics.record_packet(40);
        metrics.inc_messages();

        EventLogger::log_metrics(&metrics);
        assert!(logs_contain("Capture totals"));
        assert!(logs_contain("packets=2"));
        assert!(logs_contain("bytes=100"));
        assert!(logs_contain("messages=1"));
    }
}
