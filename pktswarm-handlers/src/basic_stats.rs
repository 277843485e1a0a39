//! ## pktswarm-handlers::basic_stats
//! **Packet and byte totals per window**
//!
//! Keeps the last [`HISTORY_LEN`] closed windows so a report can show a trend, though the
//! tabular row only carries the newest one.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use pktswarm_protocols::{DecodedPacket, TransportKind};

use crate::handler::Handler;
use crate::report::Report;

pub const HISTORY_LEN: usize = 10;

const HEADER: [&str; 10] = [
    "pktCount",
    "pktSize",
    "tcpCount",
    "tcpSize",
    "udpCount",
    "udpSize",
    "icmp4Count",
    "icmp4Size",
    "icmp6Count",
    "icmp6Size",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub packets: u64,
    pub bytes: u64,
}

impl Counter {
    fn add(&mut self, len: u64) {
        self.packets += 1;
        self.bytes += len;
    }
}

/// Totals for one reporting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsWindow {
    pub started: DateTime<Utc>,
    pub total: Counter,
    pub tcp: Counter,
    pub udp: Counter,
    pub icmp4: Counter,
    pub icmp6: Counter,
}

impl StatsWindow {
    fn new(started: DateTime<Utc>) -> Self {
        Self {
            started,
            total: Counter::default(),
            tcp: Counter::default(),
            udp: Counter::default(),
            icmp4: Counter::default(),
            icmp6: Counter::default(),
        }
    }

    fn values(&self) -> [u64; 10] {
        [
            self.total.packets,
            self.total.bytes,
            self.tcp.packets,
            self.tcp.bytes,
            self.udp.packets,
            self.udp.bytes,
            self.icmp4.packets,
            self.icmp4.bytes,
            self.icmp6.packets,
            self.icmp6.bytes,
        ]
    }
}

#[derive(Debug)]
pub struct BasicStats {
    current: StatsWindow,
    history: VecDeque<StatsWindow>,
}

impl BasicStats {
    pub fn new() -> Self {
        Self {
            current: StatsWindow::new(Utc::now()),
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    pub fn boxed() -> Box<dyn Handler> {
        Box::new(Self::new())
    }
}

impl Default for BasicStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for BasicStats {
    fn name(&self) -> &'static str {
        "BasicStats"
    }

    fn read_packet(&mut self, packet: &DecodedPacket) {
        let len = packet.len() as u64;
        let window = &mut self.current;
        window.total.add(len);

        let Some(transport) = &packet.transport else {
            return;
        };
        match transport.kind() {
            TransportKind::Tcp => window.tcp.add(len),
            TransportKind::Udp => window.udp.add(len),
            TransportKind::Icmpv4 => window.icmp4.add(len),
            TransportKind::Icmpv6 => window.icmp6.add(len),
        }
    }

    fn make_report(&mut self) -> Report {
        let closed = std::mem::replace(&mut self.current, StatsWindow::new(Utc::now()));
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(closed);

        Report::BasicStats(BasicStatsReport {
            windows: self.history.iter().cloned().collect(),
        })
    }
}

/// Closed windows, oldest first. The last one is the window just reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicStatsReport {
    windows: Vec<StatsWindow>,
}

impl BasicStatsReport {
    pub fn latest(&self) -> Option<&StatsWindow> {
        self.windows.last()
    }

    pub fn windows(&self) -> &[StatsWindow] {
        &self.windows
    }

    pub fn header(&self) -> Vec<String> {
        HEADER.iter().map(|h| h.to_string()).collect()
    }

    pub fn row(&self) -> Vec<String> {
        self.latest_values().iter().map(u64::to_string).collect()
    }

    fn latest_values(&self) -> [u64; 10] {
        self.latest().map(StatsWindow::values).unwrap_or_default()
    }
}

impl fmt::Display for BasicStatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = HEADER
            .iter()
            .zip(self.latest_values())
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        write!(f, "{}", items.join("\t"))
    }
}
