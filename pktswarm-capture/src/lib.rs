//! pktswarm‑capture
//!
//! Provides a unified frame source interface for pktswarm.
//! Frames come either from libpcap (live device or offline savefile) or from memory.

pub mod error;
pub mod pcap_source;
pub mod replay;
pub mod source;

pub use error::CaptureError;
pub use pcap_source::{CaptureOptions, PcapSource};
pub use replay::ReplaySource;
pub use source::{CaptureSource, FrameSource};
