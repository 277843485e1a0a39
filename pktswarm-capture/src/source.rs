use std::fmt;
use std::path::PathBuf;

use pktswarm_protocols::DecodedPacket;

use crate::error::CaptureError;

/// Where frames are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    /// Network device name.
    Live(String),
    /// pcap savefile.
    Offline(PathBuf),
}

impl CaptureSource {
    pub fn is_live(&self) -> bool {
        matches!(self, CaptureSource::Live(_))
    }
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Live(device) => write!(f, "device {device}"),
            CaptureSource::Offline(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Blocking producer of decoded frames.
pub trait FrameSource: Send {
    /// Next frame, `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<DecodedPacket>, CaptureError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<DecodedPacket>, CaptureError> {
        (**self).next_frame()
    }
}
