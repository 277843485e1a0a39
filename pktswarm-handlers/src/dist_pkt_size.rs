//! ## pktswarm-handlers::dist_pkt_size
//! **Packet size histogram**

use std::collections::VecDeque;
use std::fmt;

use pktswarm_protocols::DecodedPacket;

use crate::handler::Handler;
use crate::report::Report;

/// Inclusive upper bounds; anything larger lands in the overflow bucket.
pub const BOUNDARIES: [usize; 5] = [90, 200, 500, 1000, 1500];
pub const BUCKETS: usize = BOUNDARIES.len() + 1;
pub const HISTORY_LEN: usize = 10;

pub type Distribution = [u64; BUCKETS];

/// Bucket index for a packet of `size` bytes.
pub fn bucket_index(size: usize) -> usize {
    BOUNDARIES
        .iter()
        .position(|&upper| size <= upper)
        .unwrap_or(BOUNDARIES.len())
}

#[derive(Debug)]
pub struct DistPktSize {
    current: Distribution,
    history: VecDeque<Distribution>,
}

impl DistPktSize {
    pub fn new() -> Self {
        Self {
            current: [0; BUCKETS],
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    pub fn boxed() -> Box<dyn Handler> {
        Box::new(Self::new())
    }
}

impl Default for DistPktSize {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for DistPktSize {
    fn name(&self) -> &'static str {
        "DistPktSize"
    }

    fn read_packet(&mut self, packet: &DecodedPacket) {
        self.current[bucket_index(packet.len())] += 1;
    }

    fn make_report(&mut self) -> Report {
        let closed = std::mem::replace(&mut self.current, [0; BUCKETS]);
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(closed);

        Report::PacketSize(PacketSizeReport {
            windows: self.history.iter().copied().collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketSizeReport {
    windows: Vec<Distribution>,
}

impl PacketSizeReport {
    pub fn latest(&self) -> Distribution {
        self.windows.last().copied().unwrap_or_default()
    }

    /// Retained windows, oldest first.
    pub fn windows(&self) -> &[Distribution] {
        &self.windows
    }

    pub fn header(&self) -> Vec<String> {
        BOUNDARIES
            .iter()
            .map(|upper| format!("~{upper}"))
            .chain(std::iter::once(format!("{}~", BOUNDARIES[BOUNDARIES.len() - 1])))
            .collect()
    }

    pub fn row(&self) -> Vec<String> {
        self.latest().iter().map(u64::to_string).collect()
    }
}

impl fmt::Display for PacketSizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overflow = format!("{}...", BOUNDARIES[BOUNDARIES.len() - 1]);
        let labels = BOUNDARIES
            .iter()
            .map(|upper| format!("...{upper}"))
            .chain(std::iter::once(overflow));

        for (idx, label) in labels.enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{label:>8}: ")?;
            for window in &self.windows {
                write!(f, "{:>6} ", window[idx])?;
            }
        }
        Ok(())
    }
}
