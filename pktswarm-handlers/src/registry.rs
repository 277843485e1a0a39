//! ## pktswarm-handlers::registry
//! Name-to-constructor lookup, built once at startup and passed where needed.

use std::fmt;
use std::str::FromStr;

use crate::basic_stats::BasicStats;
use crate::dist_pkt_size::DistPktSize;
use crate::error::HandlerError;
use crate::handler::Handler;
use crate::pipeline::Pipeline;
use crate::session_count::SessionCount;

pub type HandlerConstructor = fn() -> Box<dyn Handler>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    BasicStats,
    PacketSizeDistribution,
    SessionCounter,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 3] = [
        HandlerKind::BasicStats,
        HandlerKind::PacketSizeDistribution,
        HandlerKind::SessionCounter,
    ];

    /// Name used on the command line and in config files.
    pub fn name(&self) -> &'static str {
        match self {
            HandlerKind::BasicStats => "BasicStats",
            HandlerKind::PacketSizeDistribution => "DistPktSize",
            HandlerKind::SessionCounter => "SessionCount",
        }
    }

    pub fn constructor(&self) -> HandlerConstructor {
        match self {
            HandlerKind::BasicStats => BasicStats::boxed,
            HandlerKind::PacketSizeDistribution => DistPktSize::boxed,
            HandlerKind::SessionCounter => SessionCount::boxed,
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HandlerKind {
    type Err = HandlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HandlerKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| HandlerError::UnknownHandler(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    entries: Vec<(&'static str, HandlerConstructor)>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            entries: HandlerKind::ALL
                .iter()
                .map(|kind| (kind.name(), kind.constructor()))
                .collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Handler>, HandlerError> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, ctor)| ctor())
            .ok_or_else(|| HandlerError::UnknownHandler(name.to_string()))
    }

    /// Builds a pipeline from handler names, in the given order.
    pub fn build<S: AsRef<str>>(&self, names: &[S]) -> Result<Pipeline, HandlerError> {
        if names.is_empty() {
            return Err(HandlerError::NoHandlers);
        }
        let handlers = names
            .iter()
            .map(|name| self.create(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Pipeline::new(handlers))
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
