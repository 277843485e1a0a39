//! # pktswarm-core
//!
//! Streaming flow tracking over decoded packets.
//!
//! ### Key Submodules:
//! - `flow`: symmetric flow hashing and the flow table
//! - `time`: timing wheel driven by packet timestamps
//!
//! Nothing here reads a wall clock. Every timer decision is made from the timestamps of
//! the packets fed in, so an offline replay behaves exactly like the live capture did.

pub mod error;
pub mod flow;
pub mod time;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::flow::*;
    pub use crate::time::*;
}

pub use error::CoreError;
pub use flow::{Direction, Flow, FlowHash, FlowQuery, FlowTable, IngestOutcome, Node, TcpState};
pub use time::{TimerAction, TimingWheel, WheelError};
