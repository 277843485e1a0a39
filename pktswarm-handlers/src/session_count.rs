use std::collections::HashMap;
use std::fmt;

use pktswarm_core::flow::{packet_flow_hash, FlowHash};
use pktswarm_protocols::DecodedPacket;

use crate::handler::Handler;
use crate::report::Report;

/// Distinct TCP/UDP sessions per window, keyed by symmetric flow hash.
#[derive(Debug, Default)]
pub struct SessionCount {
    counts: HashMap<FlowHash, u64>,
}

impl SessionCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed() -> Box<dyn Handler> {
        Box::new(Self::new())
    }
}

impl Handler for SessionCount {
    fn name(&self) -> &'static str {
        "SessionCount"
    }

    fn read_packet(&mut self, packet: &DecodedPacket) {
        if let Some((hash, _)) = packet_flow_hash(packet) {
            *self.counts.entry(hash).or_default() += 1;
        }
    }

    fn make_report(&mut self) -> Report {
        Report::Sessions(SessionReport {
            counts: std::mem::take(&mut self.counts),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    counts: HashMap<FlowHash, u64>,
}

impl SessionReport {
    pub fn sessions(&self) -> usize {
        self.counts.len()
    }

    /// Packets seen for `hash` in the window, in both directions.
    pub fn packets(&self, hash: FlowHash) -> u64 {
        self.counts.get(&hash).copied().unwrap_or(0)
    }

    pub fn header(&self) -> Vec<String> {
        vec!["Session".to_string()]
    }

    pub fn row(&self) -> Vec<String> {
        vec![self.sessions().to_string()]
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session = {}", self.sessions())
    }
}
