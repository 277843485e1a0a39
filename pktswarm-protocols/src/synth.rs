//! ## pktswarm-protocols::synth
//! Synthetic Ethernet frames for replay scenarios, tests and benchmarks.
//!
//! Checksums are left zero; nothing in the decoder verifies them.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, Bytes, BytesMut};

use crate::transport::{IPPROTO_ICMP, IPPROTO_TCP, IPPROTO_UDP};

const SRC_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
const DST_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x02];

/// TCP flag bits used by [`tcp_frame_with_flags`].
pub const TCP_FIN: u8 = 0x01;
pub const TCP_SYN: u8 = 0x02;
pub const TCP_ACK: u8 = 0x10;

/// One side of a synthetic conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: IpAddr,
    pub port: u16,
}

impl Endpoint {
    pub const fn new(addr: IpAddr, port: u16) -> Self {
        Self { addr, port }
    }

    pub const fn v4(o: [u8; 4], port: u16) -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::new(o[0], o[1], o[2], o[3])), port)
    }
}

/// Ethernet/IP/TCP frame with the ACK flag set and `payload_len` zero bytes of payload.
pub fn tcp_frame(src: Endpoint, dst: Endpoint, payload_len: usize) -> Bytes {
    tcp_frame_with_flags(src, dst, TCP_ACK, payload_len)
}

pub fn tcp_frame_with_flags(src: Endpoint, dst: Endpoint, flags: u8, payload_len: usize) -> Bytes {
    let mut segment = BytesMut::with_capacity(20 + payload_len);
    segment.put_u16(src.port);
    segment.put_u16(dst.port);
    segment.put_u32(1); // sequence
    segment.put_u32(0); // acknowledgment
    segment.put_u8(0x50); // data offset 5 words
    segment.put_u8(flags);
    segment.put_u16(0xffff); // window
    segment.put_u16(0); // checksum
    segment.put_u16(0); // urgent pointer
    segment.put_bytes(0, payload_len);
    ip_frame(src.addr, dst.addr, IPPROTO_TCP, &segment)
}

/// Ethernet/IP/UDP frame with `payload_len` zero bytes of payload.
pub fn udp_frame(src: Endpoint, dst: Endpoint, payload_len: usize) -> Bytes {
    let mut dgram = BytesMut::with_capacity(8 + payload_len);
    dgram.put_u16(src.port);
    dgram.put_u16(dst.port);
    dgram.put_u16((8 + payload_len) as u16);
    dgram.put_u16(0);
    dgram.put_bytes(0, payload_len);
    ip_frame(src.addr, dst.addr, IPPROTO_UDP, &dgram)
}

/// Ethernet/IPv4/ICMP echo request.
pub fn icmp_echo_frame(src: [u8; 4], dst: [u8; 4], payload_len: usize) -> Bytes {
    let mut msg = BytesMut::with_capacity(8 + payload_len);
    msg.put_u8(8); // echo request
    msg.put_u8(0);
    msg.put_u16(0);
    msg.put_u32(0x0001_0001); // identifier, sequence
    msg.put_bytes(0, payload_len);
    ip_frame(
        IpAddr::V4(Ipv4Addr::from(src)),
        IpAddr::V4(Ipv4Addr::from(dst)),
        IPPROTO_ICMP,
        &msg,
    )
}

fn ip_frame(src: IpAddr, dst: IpAddr, protocol: u8, payload: &[u8]) -> Bytes {
    let mut frame = BytesMut::with_capacity(14 + 40 + payload.len());
    frame.put_slice(&DST_MAC);
    frame.put_slice(&SRC_MAC);

    match (src, dst) {
        (IpAddr::V4(src), IpAddr::V4(dst)) => {
            frame.put_u16(0x0800);
            frame.put_u8(0x45);
            frame.put_u8(0);
            frame.put_u16((20 + payload.len()) as u16);
            frame.put_u16(0); // identification
            frame.put_u16(0x4000); // don't fragment
            frame.put_u8(64);
            frame.put_u8(protocol);
            frame.put_u16(0);
            frame.put_slice(&src.octets());
            frame.put_slice(&dst.octets());
        }
        (src, dst) => {
            frame.put_u16(0x86DD);
            frame.put_u32(0x6000_0000);
            frame.put_u16(payload.len() as u16);
            frame.put_u8(protocol);
            frame.put_u8(64);
            frame.put_slice(&to_v6(src).octets());
            frame.put_slice(&to_v6(dst).octets());
        }
    }

    frame.put_slice(payload);
    frame.freeze()
}

fn to_v6(addr: IpAddr) -> Ipv6Addr {
    match addr {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_lengths() {
        let a = Endpoint::v4([1, 1, 1, 1], 1000);
        let b = Endpoint::v4([2, 2, 2, 2], 80);
        assert_eq!(tcp_frame(a, b, 0).len(), 14 + 20 + 20);
        assert_eq!(udp_frame(a, b, 10).len(), 14 + 20 + 8 + 10);
        assert_eq!(icmp_echo_frame([1, 1, 1, 1], [2, 2, 2, 2], 0).len(), 14 + 20 + 8);
    }

    #[test]
    fn mixed_families_fall_back_to_ipv6() {
        let a = Endpoint::v4([1, 1, 1, 1], 1000);
        let b = Endpoint::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 80);
        let frame = udp_frame(a, b, 0);
        assert_eq!(&frame[12..14], &[0x86, 0xDD]);
        assert_eq!(frame.len(), 14 + 40 + 8);
    }
}
