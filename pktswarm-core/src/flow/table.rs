use std::collections::hash_map::{Entry, HashMap};
use std::net::IpAddr;
use std::time::Duration;

use pktswarm_protocols::{DecodedPacket, TransportKind};
use tracing::{debug, trace};

use super::hash::{flow_hash, Direction, FlowHash};
use crate::error::CoreError;
use crate::time::{TimerAction, TimingWheel};

/// Connection state slot on each node. Nothing drives it yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TcpState {
    #[default]
    Unset,
    Syn,
    SynAck,
    Established,
    Fin,
}

/// One endpoint of a flow and what it has sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub addr: IpAddr,
    pub port: u16,
    pub last_seen: Duration,
    pub bytes: u64,
    pub packets: u64,
    pub state: TcpState,
}

impl Node {
    fn new(addr: IpAddr, port: u16, seen: Duration) -> Self {
        Self {
            addr,
            port,
            last_seen: seen,
            bytes: 0,
            packets: 0,
            state: TcpState::Unset,
        }
    }

    fn credit(&mut self, timestamp: Duration, len: u64) {
        self.packets += 1;
        self.bytes += len;
        self.last_seen = timestamp;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    pub hash: FlowHash,
    pub protocol: TransportKind,
    /// Source of the first packet seen.
    pub client: Node,
    pub server: Node,
    pub latest: Duration,
    /// Set by traffic, cleared by each expiry check.
    pub touched: bool,
    origin: Direction,
}

impl Flow {
    /// IANA protocol number of the flow's transport.
    pub fn protocol_number(&self) -> u8 {
        self.protocol.ip_protocol()
    }

    pub fn packets(&self) -> u64 {
        self.client.packets + self.server.packets
    }

    pub fn bytes(&self) -> u64 {
        self.client.bytes + self.server.bytes
    }

    fn record(&mut self, direction: Direction, timestamp: Duration, len: u64) {
        let sender = if direction == self.origin {
            &mut self.client
        } else {
            &mut self.server
        };
        sender.credit(timestamp, len);
        self.latest = self.latest.max(timestamp);
    }
}

/// Selects flows returned by [`FlowTable::fetch`]. The default matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowQuery {
    pub protocol: Option<TransportKind>,
}

impl FlowQuery {
    pub fn with_protocol(mut self, protocol: TransportKind) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn matches(&self, flow: &Flow) -> bool {
        self.protocol.map_or(true, |p| p == flow.protocol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Created(FlowHash),
    Updated(FlowHash),
    /// No IP layer or no TCP/UDP ports.
    Skipped,
}

enum Expiry {
    Rearm(Duration),
    Evicted(Flow),
    Missing,
}

/// Live flows keyed by symmetric hash, expired on packet time.
#[derive(Debug)]
pub struct FlowTable {
    flows: HashMap<FlowHash, Flow>,
    wheel: TimingWheel<FlowHash>,
    timeout: Duration,
    expired_total: u64,
}

impl FlowTable {
    /// Creates a table whose flows expire after `timeout` without traffic.
    ///
    /// The wheel must cover `timeout` plus one slot, since already-due expiries are pushed
    /// one tick forward.
    pub fn new(
        timeout: Duration,
        slot_count: usize,
        slot_duration: Duration,
    ) -> Result<Self, CoreError> {
        let wheel = TimingWheel::new(slot_count, slot_duration)?;
        let horizon = wheel.horizon();
        if timeout.saturating_add(slot_duration) > horizon {
            return Err(CoreError::TimeoutExceedsHorizon { timeout, horizon });
        }

        Ok(Self {
            flows: HashMap::new(),
            wheel,
            timeout,
            expired_total: 0,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn get(&self, hash: FlowHash) -> Option<&Flow> {
        self.flows.get(&hash)
    }

    /// Flows evicted since the table was created.
    pub fn expired_total(&self) -> u64 {
        self.expired_total
    }

    /// Moves packet time to `timestamp` and runs every expiry check that came due.
    /// Returns how many flows were evicted.
    pub fn advance(&mut self, timestamp: Duration) -> Result<usize, CoreError> {
        let flows = &mut self.flows;
        let timeout = self.timeout;
        let mut evicted = 0;

        self.wheel.advance(timestamp, |hash| {
            match check_expire(flows, hash, timeout) {
                Expiry::Rearm(at) => TimerAction::Rearm(at),
                Expiry::Evicted(flow) => {
                    debug!(
                        flow = %flow.hash,
                        packets = flow.packets(),
                        bytes = flow.bytes(),
                        "Flow expired"
                    );
                    evicted += 1;
                    TimerAction::Release
                }
                Expiry::Missing => TimerAction::Release,
            }
        })?;

        self.expired_total += evicted as u64;
        Ok(evicted)
    }

    /// Accounts one packet, creating its flow on first sight.
    pub fn ingest(&mut self, packet: &DecodedPacket) -> Result<IngestOutcome, CoreError> {
        self.advance(packet.timestamp)?;

        let (Some(network), Some(transport)) = (&packet.network, &packet.transport) else {
            return Ok(IngestOutcome::Skipped);
        };
        let Some((src_port, dst_port)) = transport.ports() else {
            return Ok(IngestOutcome::Skipped);
        };

        let (src, dst) = (network.source(), network.destination());
        let (hash, direction) = flow_hash(src, src_port, dst, dst_port, transport.kind());
        let ts = packet.timestamp;
        let len = packet.len() as u64;

        let outcome = match self.flows.entry(hash) {
            Entry::Occupied(entry) => {
                let flow = entry.into_mut();
                flow.touched = true;
                flow.record(direction, ts, len);
                IngestOutcome::Updated(hash)
            }
            Entry::Vacant(entry) => {
                self.wheel.schedule(hash, ts.saturating_add(self.timeout))?;
                let flow = entry.insert(Flow {
                    hash,
                    protocol: transport.kind(),
                    client: Node::new(src, src_port, ts),
                    server: Node::new(dst, dst_port, ts),
                    latest: ts,
                    touched: false,
                    origin: direction,
                });
                flow.record(direction, ts, len);
                trace!(flow = %hash, %src, src_port, %dst, dst_port, "New flow");
                IngestOutcome::Created(hash)
            }
        };

        Ok(outcome)
    }

    /// Snapshot of the live flows matching `query`.
    pub fn fetch(&self, query: &FlowQuery) -> Vec<Flow> {
        self.flows
            .values()
            .filter(|flow| query.matches(flow))
            .cloned()
            .collect()
    }
}

fn check_expire(flows: &mut HashMap<FlowHash, Flow>, hash: FlowHash, timeout: Duration) -> Expiry {
    let Some(flow) = flows.get_mut(&hash) else {
        return Expiry::Missing;
    };

    if flow.touched {
        flow.touched = false;
        return Expiry::Rearm(flow.latest.saturating_add(timeout));
    }

    match flows.remove(&hash) {
        Some(flow) => Expiry::Evicted(flow),
        None => Expiry::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use pktswarm_protocols::synth::{self, Endpoint};
    use pktswarm_protocols::LinkType;

    fn table() -> FlowTable {
        FlowTable::new(Duration::from_secs(5), 128, Duration::from_millis(100)).unwrap()
    }

    fn packet(frame: Bytes, millis: u64) -> DecodedPacket {
        DecodedPacket::decode(Duration::from_millis(millis), frame, LinkType::Ethernet)
    }

    fn tcp(src: Endpoint, dst: Endpoint, payload: usize, millis: u64) -> DecodedPacket {
        packet(synth::tcp_frame(src, dst, payload), millis)
    }

    const CLIENT: Endpoint = Endpoint::v4([192, 168, 1, 10], 50123);
    const SERVER: Endpoint = Endpoint::v4([10, 0, 0, 80], 80);

    #[test]
    fn timeout_must_fit_horizon() {
        let err = FlowTable::new(Duration::from_secs(5), 4, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CoreError::TimeoutExceedsHorizon { .. }));
        assert!(FlowTable::new(Duration::from_secs(3), 4, Duration::from_secs(1)).is_ok());
        assert!(matches!(
            FlowTable::new(Duration::from_secs(3), 0, Duration::from_secs(1)),
            Err(CoreError::Capacity(_))
        ));
    }

    #[test]
    fn both_directions_share_one_flow() {
        let mut table = table();
        let first = table.ingest(&tcp(CLIENT, SERVER, 100, 0)).unwrap();
        let second = table.ingest(&tcp(SERVER, CLIENT, 50, 10)).unwrap();

        let IngestOutcome::Created(hash) = first else {
            panic!("expected a new flow, got {first:?}");
        };
        assert_eq!(second, IngestOutcome::Updated(hash));
        assert_eq!(table.len(), 1);

        let flow = table.get(hash).unwrap();
        assert_eq!(flow.protocol_number(), 6);
        assert_eq!(flow.client.addr, CLIENT.addr);
        assert_eq!(flow.client.port, CLIENT.port);
        assert_eq!((flow.client.packets, flow.client.bytes), (1, 154));
        assert_eq!(flow.server.port, SERVER.port);
        assert_eq!((flow.server.packets, flow.server.bytes), (1, 104));
        assert_eq!(flow.server.last_seen, Duration::from_millis(10));
        assert_eq!(flow.latest, Duration::from_millis(10));
        assert!(flow.touched);
        assert_eq!(flow.client.state, TcpState::Unset);
    }

    #[test]
    fn client_is_first_sender_even_when_its_key_sorts_high() {
        let mut table = table();
        let IngestOutcome::Created(hash) = table.ingest(&tcp(SERVER, CLIENT, 0, 0)).unwrap() else {
            panic!("expected a new flow");
        };
        table.ingest(&tcp(SERVER, CLIENT, 0, 1)).unwrap();
        table.ingest(&tcp(CLIENT, SERVER, 0, 2)).unwrap();

        let flow = table.get(hash).unwrap();
        assert_eq!(flow.client.addr, SERVER.addr);
        assert_eq!(flow.client.packets, 2);
        assert_eq!(flow.server.packets, 1);
    }

    #[test]
    fn tcp_and_udp_on_same_ports_are_distinct() {
        let mut table = table();
        table.ingest(&tcp(CLIENT, SERVER, 0, 0)).unwrap();
        table
            .ingest(&packet(synth::udp_frame(CLIENT, SERVER, 0), 0))
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn non_flow_packets_are_skipped() {
        let mut table = table();
        let icmp = packet(synth::icmp_echo_frame([10, 0, 0, 1], [10, 0, 0, 2], 16), 0);
        assert_eq!(table.ingest(&icmp).unwrap(), IngestOutcome::Skipped);

        let garbage = packet(Bytes::from_static(&[0u8; 10]), 0);
        assert_eq!(table.ingest(&garbage).unwrap(), IngestOutcome::Skipped);
        assert!(table.is_empty());
    }

    #[test]
    fn idle_flow_is_evicted() {
        let mut table = table();
        let IngestOutcome::Created(hash) = table.ingest(&tcp(CLIENT, SERVER, 0, 0)).unwrap() else {
            panic!("expected a new flow");
        };

        assert_eq!(table.advance(Duration::from_millis(5000)).unwrap(), 0);
        assert!(table.get(hash).is_some());

        assert_eq!(table.advance(Duration::from_millis(5100)).unwrap(), 1);
        assert!(table.get(hash).is_none());
        assert_eq!(table.expired_total(), 1);
    }

    #[test]
    fn traffic_keeps_flow_alive() {
        let mut table = table();
        let IngestOutcome::Created(hash) = table.ingest(&tcp(CLIENT, SERVER, 0, 0)).unwrap() else {
            panic!("expected a new flow");
        };
        table.ingest(&tcp(SERVER, CLIENT, 0, 4000)).unwrap();

        table.advance(Duration::from_millis(5100)).unwrap();
        let flow = table.get(hash).unwrap();
        assert!(!flow.touched);

        // Rearmed at latest + timeout = 9s.
        table.advance(Duration::from_millis(9000)).unwrap();
        assert!(table.get(hash).is_some());
        table.advance(Duration::from_millis(9100)).unwrap();
        assert!(table.get(hash).is_none());
    }

    #[test]
    fn eviction_runs_on_ingest() {
        let mut table = table();
        table.ingest(&tcp(CLIENT, SERVER, 0, 0)).unwrap();
        let other = Endpoint::v4([10, 0, 0, 81], 81);
        table.ingest(&tcp(CLIENT, other, 0, 6000)).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.expired_total(), 1);
    }

    #[test]
    fn fetch_filters_by_protocol() {
        let mut table = table();
        table.ingest(&tcp(CLIENT, SERVER, 0, 0)).unwrap();
        table
            .ingest(&packet(synth::udp_frame(CLIENT, SERVER, 0), 0))
            .unwrap();

        assert_eq!(table.fetch(&FlowQuery::default()).len(), 2);
        let udp = table.fetch(&FlowQuery::default().with_protocol(TransportKind::Udp));
        assert_eq!(udp.len(), 1);
        assert_eq!(udp[0].protocol, TransportKind::Udp);
    }
}
