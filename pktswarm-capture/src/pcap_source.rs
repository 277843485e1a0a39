//! # pcap_source Module
//!
//! Reads frames through libpcap (via the pcap crate), either from a live device or from a
//! savefile, and decodes them as they are pulled.

use std::time::Duration;

use bytes::Bytes;
use pcap::{Activated, Capture};
use tracing::{debug, info, trace};

use pktswarm_protocols::{DecodedPacket, LinkType};

use crate::error::CaptureError;
use crate::source::{CaptureSource, FrameSource};

/// Handle options applied when opening a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// BPF filter expression.
    pub filter: Option<String>,
    pub snaplen: i32,
    pub promiscuous: bool,
    /// Live read timeout in milliseconds. Ignored for savefiles.
    pub read_timeout_ms: i32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            filter: None,
            snaplen: 0xffff,
            promiscuous: true,
            read_timeout_ms: 1000,
        }
    }
}

pub struct PcapSource {
    cap: Capture<dyn Activated>,
    link: LinkType,
    live: bool,
}

impl PcapSource {
    pub fn open(source: &CaptureSource, options: &CaptureOptions) -> Result<Self, CaptureError> {
        let open_err = |error: pcap::Error| CaptureError::Open {
            source_name: source.to_string(),
            error,
        };

        let mut cap: Capture<dyn Activated> = match source {
            CaptureSource::Live(device) => Capture::from_device(device.as_str())
                .and_then(|inactive| {
                    inactive
                        .promisc(options.promiscuous)
                        .snaplen(options.snaplen)
                        .timeout(options.read_timeout_ms)
                        .open()
                })
                .map_err(open_err)?
                .into(),
            CaptureSource::Offline(path) => Capture::from_file(path).map_err(open_err)?.into(),
        };

        if let Some(filter) = &options.filter {
            cap.filter(filter, true)
                .map_err(|error| CaptureError::Filter {
                    filter: filter.clone(),
                    error,
                })?;
            debug!(%filter, "Capture filter applied");
        }

        let dlt = cap.get_datalink().0;
        let link = LinkType::from_dlt(dlt).ok_or(CaptureError::UnsupportedLinkType(dlt))?;
        info!(%source, ?link, "Capture opened");

        Ok(Self {
            cap,
            link,
            live: source.is_live(),
        })
    }

    pub fn link_type(&self) -> LinkType {
        self.link
    }
}

impl FrameSource for PcapSource {
    fn next_frame(&mut self) -> Result<Option<DecodedPacket>, CaptureError> {
        loop {
            match self.cap.next_packet() {
                Ok(packet) => {
                    let ts = packet.header.ts;
                    let secs = u64::try_from(ts.tv_sec).unwrap_or(0);
                    let micros = u32::try_from(ts.tv_usec).unwrap_or(0);
                    let timestamp = Duration::new(secs, 0) + Duration::from_micros(u64::from(micros));
                    let data = Bytes::copy_from_slice(packet.data);
                    return Ok(Some(DecodedPacket::decode(timestamp, data, self.link)));
                }
                Err(pcap::Error::TimeoutExpired) if self.live => {
                    trace!("Read timeout with no traffic");
                }
                Err(pcap::Error::NoMorePackets) => return Ok(None),
                Err(e) => return Err(CaptureError::Read(e)),
            }
        }
    }
}
