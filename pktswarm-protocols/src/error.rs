use thiserror::Error;

/// Reasons a frame produced no network layer.
///
/// These never surface to callers of `DecodedPacket::decode`; partial and non-IP traffic
/// is expected on real interfaces. Failures above the link layer are reported by
/// `etherparse` itself and only logged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{link} frame rejected: {reason}")]
    Link { link: &'static str, reason: String },
    #[error("{link} frame carries no Ethernet payload ({protocol})")]
    NotEthernetPayload { link: &'static str, protocol: String },
}
