//! Defines the Handler trait for per-interval packet statistics.
use pktswarm_protocols::DecodedPacket;

use crate::report::Report;

/// Stateful accumulator over one reporting window.
pub trait Handler: Send {
    /// Registry name of the handler.
    fn name(&self) -> &'static str;

    /// Accounts one packet in the current window.
    fn read_packet(&mut self, packet: &DecodedPacket);

    /// Closes the current window and starts an empty one.
    fn make_report(&mut self) -> Report;
}
