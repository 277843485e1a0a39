use std::fmt;

use crate::basic_stats::BasicStatsReport;
use crate::dist_pkt_size::PacketSizeReport;
use crate::session_count::SessionReport;

/// Immutable snapshot of one handler's window.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    BasicStats(BasicStatsReport),
    PacketSize(PacketSizeReport),
    Sessions(SessionReport),
}

impl Report {
    pub fn title(&self) -> &'static str {
        match self {
            Report::BasicStats(_) => "Basic Stats",
            Report::PacketSize(_) => "Packet Size Distribution",
            Report::Sessions(_) => "TCP/UDP Sessions",
        }
    }

    /// Column names, matching [`Report::row`] one to one.
    pub fn header(&self) -> Vec<String> {
        match self {
            Report::BasicStats(r) => r.header(),
            Report::PacketSize(r) => r.header(),
            Report::Sessions(r) => r.header(),
        }
    }

    pub fn row(&self) -> Vec<String> {
        match self {
            Report::BasicStats(r) => r.row(),
            Report::PacketSize(r) => r.row(),
            Report::Sessions(r) => r.row(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::BasicStats(r) => fmt::Display::fmt(r, f),
            Report::PacketSize(r) => fmt::Display::fmt(r, f),
            Report::Sessions(r) => fmt::Display::fmt(r, f),
        }
    }
}
