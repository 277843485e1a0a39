//! ## pktswarm-protocols::network
//! IPv4 and IPv6 layers.
//!
//! Only what flow identification needs is kept: the two addresses and the transport
//! protocol number. For IPv6 that is the protocol after any extension headers.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use etherparse::LaxNetSlice;

/// Decoded network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkLayer {
    Ipv4 {
        src: Ipv4Addr,
        dst: Ipv4Addr,
        protocol: u8,
    },
    Ipv6 {
        src: Ipv6Addr,
        dst: Ipv6Addr,
        next_header: u8,
    },
}

impl NetworkLayer {
    /// Converts an `etherparse` network slice; `None` for non-IP slices.
    pub fn from_slice(slice: &LaxNetSlice<'_>) -> Option<Self> {
        match slice {
            LaxNetSlice::Ipv4(ipv4) => {
                let header = ipv4.header();
                Some(NetworkLayer::Ipv4 {
                    src: header.source_addr(),
                    dst: header.destination_addr(),
                    protocol: ipv4.payload().ip_number.0,
                })
            }
            LaxNetSlice::Ipv6(ipv6) => {
                let header = ipv6.header();
                Some(NetworkLayer::Ipv6 {
                    src: header.source_addr(),
                    dst: header.destination_addr(),
                    next_header: ipv6.payload().ip_number.0,
                })
            }
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    pub fn source(&self) -> IpAddr {
        match self {
            NetworkLayer::Ipv4 { src, .. } => IpAddr::V4(*src),
            NetworkLayer::Ipv6 { src, .. } => IpAddr::V6(*src),
        }
    }

    pub fn destination(&self) -> IpAddr {
        match self {
            NetworkLayer::Ipv4 { dst, .. } => IpAddr::V4(*dst),
            NetworkLayer::Ipv6 { dst, .. } => IpAddr::V6(*dst),
        }
    }

    /// IANA protocol number of the payload.
    pub fn protocol(&self) -> u8 {
        match self {
            NetworkLayer::Ipv4 { protocol, .. } => *protocol,
            NetworkLayer::Ipv6 { next_header, .. } => *next_header,
        }
    }

    pub fn is_ipv6(&self) -> bool {
        matches!(self, NetworkLayer::Ipv6 { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etherparse::LaxSlicedPacket;

    fn ipv4_packet(protocol: u8, flags_frag: [u8; 2]) -> Vec<u8> {
        let mut p = vec![
            0x45, 0x00, 0x00, 0x1c, // version/IHL, TOS, total length 28
            0x00, 0x01, flags_frag[0], flags_frag[1], // id, flags/fragment
            0x40, protocol, 0x00, 0x00, // TTL, protocol, checksum
            10, 0, 0, 1, // src
            10, 0, 0, 2, // dst
        ];
        p.extend_from_slice(&[0x00, 0x35, 0xc3, 0x50, 0x00, 0x08, 0x00, 0x00]);
        p
    }

    fn network(data: &[u8]) -> Option<NetworkLayer> {
        let sliced = LaxSlicedPacket::from_ip(data).ok()?;
        sliced.net.as_ref().and_then(NetworkLayer::from_slice)
    }

    #[test]
    fn decodes_ipv4_addresses() {
        let layer = network(&ipv4_packet(17, [0x40, 0x00])).unwrap();
        assert_eq!(layer.source(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(layer.destination(), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(layer.protocol(), 17);
        assert!(!layer.is_ipv6());
    }

    #[test]
    fn rejects_bad_ihl() {
        let mut data = ipv4_packet(6, [0, 0]);
        data[0] = 0x44;
        assert_eq!(network(&data), None);
    }

    #[test]
    fn decodes_ipv6() {
        let mut data = vec![0x60, 0, 0, 0, 0x00, 0x08, 17, 64];
        data.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        data.extend_from_slice(&"2001:db8::1".parse::<Ipv6Addr>().unwrap().octets());
        data.extend_from_slice(&[0x14, 0xe9, 0x14, 0xe9, 0x00, 0x08, 0x00, 0x00]);

        let layer = network(&data).unwrap();
        assert!(layer.is_ipv6());
        assert_eq!(layer.source(), IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(layer.protocol(), 17);
    }

    #[test]
    fn ipv6_protocol_skips_extension_headers() {
        // Hop-by-hop options (8 bytes) ahead of UDP.
        let mut data = vec![0x60, 0, 0, 0, 0x00, 0x10, 0, 64];
        data.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        data.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        data.extend_from_slice(&[17, 0, 1, 4, 0, 0, 0, 0]);
        data.extend_from_slice(&[0x14, 0xe9, 0x14, 0xe9, 0x00, 0x08, 0x00, 0x00]);

        assert_eq!(network(&data).unwrap().protocol(), 17);
    }
}
