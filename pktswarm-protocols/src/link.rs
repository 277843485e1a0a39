//! ## pktswarm-protocols::link
//! Link-layer framing: hands the frame to `etherparse` starting at the right header.

use etherparse::{LaxSlicedPacket, LinuxSllHeader, LinuxSllProtocolType};

use crate::error::DecodeError;

/// BSD loopback prefixes each packet with a 4-byte address family.
const NULL_HEADER_LEN: usize = 4;

/// Data link types the decoder understands, named after their libpcap DLT values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// DLT_EN10MB
    Ethernet,
    /// DLT_RAW / LINKTYPE_IPV4 / LINKTYPE_IPV6
    RawIp,
    /// DLT_LINUX_SLL
    LinuxSll,
    /// DLT_NULL (BSD loopback)
    Null,
}

impl LinkType {
    /// Maps a libpcap data link type number.
    pub fn from_dlt(dlt: i32) -> Option<Self> {
        match dlt {
            0 => Some(LinkType::Null),
            1 => Some(LinkType::Ethernet),
            12 | 14 | 101 | 228 | 229 => Some(LinkType::RawIp),
            113 => Some(LinkType::LinuxSll),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            LinkType::Ethernet => "Ethernet",
            LinkType::RawIp => "raw IP",
            LinkType::LinuxSll => "Linux SLL",
            LinkType::Null => "loopback",
        }
    }

    /// Slices `data` from its link header down as far as the headers allow.
    ///
    /// Errors only when nothing past the link layer could be reached. A truncated or
    /// unknown upper layer shows up as `stop_err` on the returned slice instead.
    pub fn slice<'a>(&self, data: &'a [u8]) -> Result<LaxSlicedPacket<'a>, DecodeError> {
        let rejected = |reason: String| DecodeError::Link {
            link: self.name(),
            reason,
        };

        match self {
            LinkType::Ethernet => {
                LaxSlicedPacket::from_ethernet(data).map_err(|e| rejected(e.to_string()))
            }
            LinkType::RawIp => LaxSlicedPacket::from_ip(data).map_err(|e| rejected(e.to_string())),
            LinkType::LinuxSll => {
                let (header, rest) =
                    LinuxSllHeader::from_slice(data).map_err(|e| rejected(e.to_string()))?;
                match header.protocol_type {
                    LinuxSllProtocolType::EtherType(ether_type) => {
                        Ok(LaxSlicedPacket::from_ether_type(ether_type, rest))
                    }
                    other => Err(DecodeError::NotEthernetPayload {
                        link: self.name(),
                        protocol: format!("{other:?}"),
                    }),
                }
            }
            LinkType::Null => {
                let rest = data.get(NULL_HEADER_LEN..).ok_or_else(|| {
                    rejected(format!("{} bytes is shorter than the family header", data.len()))
                })?;
                LaxSlicedPacket::from_ip(rest).map_err(|e| rejected(e.to_string()))
            }
        }
    }
}
