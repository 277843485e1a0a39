//! # pktswarm Protocol Decoders
//!
//! Crate for decoding captured frames into the L3/L4 view the flow engine and
//! statistics handlers work on. Only headers are parsed; payloads are never inspected.

pub mod error;
pub mod link;
pub mod network;
pub mod packet;
pub mod synth;
pub mod transport;

pub use error::DecodeError;
pub use link::LinkType;
pub use network::NetworkLayer;
pub use packet::DecodedPacket;
pub use transport::{TransportKind, TransportLayer};
