//! Direction-independent flow hashing.
//!
//! Each side of a conversation is keyed as `address bytes ++ port (big-endian)`. The
//! byte-wise smaller key is hashed first, so both directions of a connection produce the
//! same value. The transport protocol number is mixed in last to keep TCP and UDP flows
//! over the same endpoints apart.
//!
//! The FNV variant is FNV-1 (xor, then multiply). Every component that computes flow
//! hashes must use this exact ordering or their hashes will disagree.

use std::fmt;
use std::net::IpAddr;

use pktswarm_protocols::{DecodedPacket, TransportKind};

pub const FNV_OFFSET_BASIS: u64 = 14695981039346656037;
pub const FNV_PRIME: u64 = 1099511628211;

/// 64-bit symmetric flow identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowHash(pub u64);

impl fmt::Display for FlowHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Which endpoint key sorted first for a given packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Source key is byte-wise smaller than the destination key.
    LowToHigh,
    /// Source key is greater than or equal to the destination key.
    HighToLow,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::LowToHigh => Direction::HighToLow,
            Direction::HighToLow => Direction::LowToHigh,
        }
    }
}

/// FNV-1 over `bytes`.
#[inline]
pub fn fnv1(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET_BASIS;
    for &b in bytes {
        h ^= u64::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Address and port of one side, as hashed.
#[derive(Clone, Copy)]
struct EndpointKey {
    buf: [u8; 18],
    len: usize,
}

impl EndpointKey {
    fn new(addr: IpAddr, port: u16) -> Self {
        let mut buf = [0u8; 18];
        let len = match addr {
            IpAddr::V4(v4) => {
                buf[..4].copy_from_slice(&v4.octets());
                4
            }
            IpAddr::V6(v6) => {
                buf[..16].copy_from_slice(&v6.octets());
                16
            }
        };
        buf[len..len + 2].copy_from_slice(&port.to_be_bytes());
        Self { buf, len: len + 2 }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Hashes one packet's endpoints.
pub fn flow_hash(
    src: IpAddr,
    src_port: u16,
    dst: IpAddr,
    dst_port: u16,
    kind: TransportKind,
) -> (FlowHash, Direction) {
    let src_key = EndpointKey::new(src, src_port);
    let dst_key = EndpointKey::new(dst, dst_port);
    let (src_bytes, dst_bytes) = (src_key.as_bytes(), dst_key.as_bytes());

    let (mut hv, direction) = if src_bytes < dst_bytes {
        (
            fnv1(src_bytes).wrapping_add(fnv1(dst_bytes)),
            Direction::LowToHigh,
        )
    } else {
        (
            fnv1(dst_bytes).wrapping_add(fnv1(src_bytes)),
            Direction::HighToLow,
        )
    };
    hv ^= u64::from(kind.ip_protocol());
    hv = hv.wrapping_mul(FNV_PRIME);

    (FlowHash(hv), direction)
}

/// Flow hash of a decoded packet, if it has both an IP layer and a port-carrying
/// transport layer.
pub fn packet_flow_hash(packet: &DecodedPacket) -> Option<(FlowHash, Direction)> {
    let network = packet.network.as_ref()?;
    let transport = packet.transport.as_ref()?;
    let (src_port, dst_port) = transport.ports()?;
    Some(flow_hash(
        network.source(),
        src_port,
        network.destination(),
        dst_port,
        transport.kind(),
    ))
}
