//! ## pktswarm-core::flow
//! **Bidirectional flow tracking**
//!
//! `hash` collapses both directions of a connection into one key; `table` keeps one
//! record per key and expires idle records through the timing wheel.

pub mod hash;
pub mod table;

pub use hash::{flow_hash, fnv1, packet_flow_hash, Direction, FlowHash};
pub use table::{Flow, FlowQuery, FlowTable, IngestOutcome, Node, TcpState};
