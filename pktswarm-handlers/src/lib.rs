//! # pktswarm Handlers
//!
//! Crate for the per-interval statistics collectors and the pipeline that bundles their
//! reports into one outbound message.
//!
//! ### Components:
//! - `basic_stats`: packet and byte totals, overall and per transport
//! - `dist_pkt_size`: packet size histogram
//! - `session_count`: distinct TCP/UDP sessions
//! - `registry`: name lookup used to build a pipeline at startup
//! - `pipeline`: fan-out of packets and aggregation into a [`Message`]

pub mod basic_stats;
pub mod dist_pkt_size;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod session_count;

pub use basic_stats::BasicStats;
pub use dist_pkt_size::DistPktSize;
pub use error::HandlerError;
pub use handler::Handler;
pub use pipeline::{Message, Pipeline};
pub use registry::{HandlerKind, HandlerRegistry};
pub use report::Report;
pub use session_count::SessionCount;
