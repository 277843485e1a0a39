//! ## pktswarm-protocols::transport
//! TCP, UDP and ICMP layers, converted from `etherparse` transport slices.

use std::fmt;

use etherparse::{TcpSlice, TransportSlice};

pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;
pub const IPPROTO_ICMPV6: u8 = 58;

/// Transport protocol family, without header contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Tcp,
    Udp,
    Icmpv4,
    Icmpv6,
}

impl TransportKind {
    /// IANA protocol number. Also used as the type tag mixed into flow hashes.
    pub fn ip_protocol(&self) -> u8 {
        match self {
            TransportKind::Tcp => IPPROTO_TCP,
            TransportKind::Udp => IPPROTO_UDP,
            TransportKind::Icmpv4 => IPPROTO_ICMP,
            TransportKind::Icmpv6 => IPPROTO_ICMPV6,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Tcp => write!(f, "TCP"),
            TransportKind::Udp => write!(f, "UDP"),
            TransportKind::Icmpv4 => write!(f, "ICMPv4"),
            TransportKind::Icmpv6 => write!(f, "ICMPv6"),
        }
    }
}

/// Decoded transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportLayer {
    Tcp {
        src_port: u16,
        dst_port: u16,
        /// Raw flag bits (FIN = 0x01 ... CWR = 0x80).
        flags: u8,
    },
    Udp {
        src_port: u16,
        dst_port: u16,
    },
    Icmpv4 {
        icmp_type: u8,
        code: u8,
    },
    Icmpv6 {
        icmp_type: u8,
        code: u8,
    },
}

impl TransportLayer {
    /// Converts an `etherparse` transport slice, keeping ports, TCP flags and ICMP type/code.
    pub fn from_slice(slice: &TransportSlice<'_>) -> Option<Self> {
        match slice {
            TransportSlice::Tcp(tcp) => Some(TransportLayer::Tcp {
                src_port: tcp.source_port(),
                dst_port: tcp.destination_port(),
                flags: tcp_flags(tcp),
            }),
            TransportSlice::Udp(udp) => Some(TransportLayer::Udp {
                src_port: udp.source_port(),
                dst_port: udp.destination_port(),
            }),
            TransportSlice::Icmpv4(icmp) => Some(TransportLayer::Icmpv4 {
                icmp_type: icmp.type_u8(),
                code: icmp.code_u8(),
            }),
            TransportSlice::Icmpv6(icmp) => Some(TransportLayer::Icmpv6 {
                icmp_type: icmp.type_u8(),
                code: icmp.code_u8(),
            }),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            TransportLayer::Tcp { .. } => TransportKind::Tcp,
            TransportLayer::Udp { .. } => TransportKind::Udp,
            TransportLayer::Icmpv4 { .. } => TransportKind::Icmpv4,
            TransportLayer::Icmpv6 { .. } => TransportKind::Icmpv6,
        }
    }

    /// Source and destination ports; `None` for ICMP.
    pub fn ports(&self) -> Option<(u16, u16)> {
        match self {
            TransportLayer::Tcp {
                src_port, dst_port, ..
            }
            | TransportLayer::Udp { src_port, dst_port } => Some((*src_port, *dst_port)),
            TransportLayer::Icmpv4 { .. } | TransportLayer::Icmpv6 { .. } => None,
        }
    }
}

/// Packs the flag bits back into the header's flags byte, FIN in bit 0.
fn tcp_flags(tcp: &TcpSlice<'_>) -> u8 {
    [
        tcp.fin(),
        tcp.syn(),
        tcp.rst(),
        tcp.psh(),
        tcp.ack(),
        tcp.urg(),
        tcp.ece(),
        tcp.cwr(),
    ]
    .iter()
    .enumerate()
    .fold(0, |bits, (bit, set)| if *set { bits | 1 << bit } else { bits })
}
