use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use pktswarm_protocols::{DecodedPacket, LinkType};

use crate::error::CaptureError;
use crate::source::FrameSource;

/// Frames held in memory, replayed in order.
#[derive(Debug, Default)]
pub struct ReplaySource {
    frames: VecDeque<DecodedPacket>,
    failure: Option<CaptureError>,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = DecodedPacket>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            failure: None,
        }
    }

    /// Decodes raw `(timestamp, frame)` pairs of one link type.
    pub fn from_raw(link: LinkType, frames: impl IntoIterator<Item = (Duration, Bytes)>) -> Self {
        Self::new(
            frames
                .into_iter()
                .map(|(ts, data)| DecodedPacket::decode(ts, data, link)),
        )
    }

    /// Fails with `error` once the frames run out, instead of ending the stream.
    pub fn with_failure(mut self, error: CaptureError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<DecodedPacket>, CaptureError> {
        if let Some(frame) = self.frames.pop_front() {
            return Ok(Some(frame));
        }
        match self.failure.take() {
            Some(error) => Err(error),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pktswarm_protocols::synth::{self, Endpoint};

    #[test]
    fn replays_in_order_then_ends() {
        let a = Endpoint::v4([10, 0, 0, 1], 1000);
        let b = Endpoint::v4([10, 0, 0, 2], 2000);
        let mut source = ReplaySource::from_raw(
            LinkType::Ethernet,
            [
                (Duration::from_secs(1), synth::tcp_frame(a, b, 0)),
                (Duration::from_secs(2), synth::udp_frame(a, b, 0)),
            ],
        );
        assert_eq!(source.remaining(), 2);

        assert_eq!(source.next_frame().unwrap().unwrap().timestamp, Duration::from_secs(1));
        assert_eq!(source.next_frame().unwrap().unwrap().timestamp, Duration::from_secs(2));
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn failure_follows_last_frame() {
        let mut source = ReplaySource::new([DecodedPacket::from_layers(
            Duration::ZERO,
            Bytes::from_static(&[0u8; 4]),
            None,
            None,
        )])
        .with_failure(CaptureError::Read(pcap::Error::PcapError("link down".into())));

        assert!(source.next_frame().unwrap().is_some());
        assert!(matches!(source.next_frame(), Err(CaptureError::Read(_))));
        assert!(source.next_frame().unwrap().is_none());
    }
}
