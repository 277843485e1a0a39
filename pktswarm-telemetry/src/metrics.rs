//! ## pktswarm-telemetry::metrics
//! **Prometheus counters for the capture loop**

use prometheus::{IntCounter, IntGauge, Registry};

use crate::error::TelemetryError;

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub packets: IntCounter,
    pub bytes: IntCounter,
    pub flows_active: IntGauge,
    pub flows_expired: IntCounter,
    pub messages: IntCounter,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let packets = IntCounter::new("pktswarm_packets_total", "Total frames read")?;
        let bytes = IntCounter::new("pktswarm_bytes_total", "Total captured bytes")?;
        let flows_active = IntGauge::new("pktswarm_flows_active", "Flows currently tracked")?;
        let flows_expired =
            IntCounter::new("pktswarm_flows_expired_total", "Flows evicted after idling")?;
        let messages = IntCounter::new("pktswarm_messages_total", "Report messages published")?;

        registry.register(Box::new(packets.clone()))?;
        registry.register(Box::new(bytes.clone()))?;
        registry.register(Box::new(flows_active.clone()))?;
        registry.register(Box::new(flows_expired.clone()))?;
        registry.register(Box::new(messages.clone()))?;

        Ok(Self {
            registry,
            packets,
            bytes,
            flows_active,
            flows_expired,
            messages,
        })
    }

    /// Prometheus text exposition of every registered metric.
    pub fn gather_metrics(&self) -> Result<String, TelemetryError> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    #[inline]
    pub fn record_packet(&self, len: usize) {
        self.packets.inc();
        self.bytes.inc_by(len as u64);
    }

    pub fn set_active_flows(&self, flows: usize) {
        self.flows_active.set(i64::try_from(flows).unwrap_or(i64::MAX));
    }

    pub fn add_expired_flows(&self, flows: usize) {
        self.flows_expired.inc_by(flows as u64);
    }

    pub fn inc_messages(&self) {
        self.messages.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_render_in_text_format() {
        let metrics = MetricsRecorder::new().unwrap();
        metrics.record_packet(1500);
        metrics.set_active_flows(3);
        metrics.add_expired_flows(2);
        metrics.inc_messages();

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("pktswarm_packets_total 1"));
        assert!(text.contains("pktswarm_bytes_total 1500"));
        assert!(text.contains("pktswarm_flows_active 3"));
        assert!(text.contains("pktswarm_flows_expired_total 2"));
        assert!(text.contains("pktswarm_messages_total 1"));
    }

    #[test]
    fn clones_share_counters() {
        let metrics = MetricsRecorder::new().unwrap();
        let shared = metrics.clone();
        shared.record_packet(10);
        assert_eq!(metrics.packets.get(), 1);
    }
}
