//! ## pktswarm-protocols::packet
//! The decoded frame handed to the flow table and statistics handlers.

use std::time::Duration;

use bytes::Bytes;
use tracing::trace;

use crate::link::LinkType;
use crate::network::NetworkLayer;
use crate::transport::TransportLayer;

/// A captured frame with its timestamp and whatever L3/L4 headers could be decoded.
#[derive(Debug, Clone)]
pub struct DecodedPacket {
    /// Capture timestamp, as an offset from the Unix epoch.
    pub timestamp: Duration,
    /// Captured bytes, starting at the link header.
    pub data: Bytes,
    pub network: Option<NetworkLayer>,
    pub transport: Option<TransportLayer>,
}

impl DecodedPacket {
    /// Decodes `data` as a frame of the given link type.
    ///
    /// Never fails: a layer that cannot be decoded is absent, as is everything above it.
    pub fn decode(timestamp: Duration, data: Bytes, link: LinkType) -> Self {
        let (network, transport) = decode_layers(&data, link);
        Self {
            timestamp,
            data,
            network,
            transport,
        }
    }

    /// Builds a packet from already-decoded layers.
    pub fn from_layers(
        timestamp: Duration,
        data: Bytes,
        network: Option<NetworkLayer>,
        transport: Option<TransportLayer>,
    ) -> Self {
        Self {
            timestamp,
            data,
            network,
            transport,
        }
    }

    /// Captured length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn decode_layers(data: &[u8], link: LinkType) -> (Option<NetworkLayer>, Option<TransportLayer>) {
    let sliced = match link.slice(data) {
        Ok(sliced) => sliced,
        Err(e) => {
            trace!("No network layer: {e}");
            return (None, None);
        }
    };
    if let Some((err, layer)) = &sliced.stop_err {
        trace!(?layer, "Decoding stopped early: {err}");
    }

    let Some(network) = sliced.net.as_ref().and_then(NetworkLayer::from_slice) else {
        return (None, None);
    };
    let transport = sliced
        .transport
        .as_ref()
        .and_then(TransportLayer::from_slice);
    (Some(network), transport)
}
