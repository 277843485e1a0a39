//! # pktswarm Engine
//!
//! The capture loop: pulls frames from a [`FrameSource`](pktswarm_capture::FrameSource),
//! feeds the flow table and handler pipeline, and publishes one message per reporting
//! interval.

mod error;
mod swarm;

pub use self::{
    error::EngineError,
    swarm::{RunSummary, Swarm, SwarmHandle, FRAME_CHANNEL_CAPACITY, MESSAGE_CHANNEL_CAPACITY},
};

pub mod prelude {
    pub use super::{EngineError, RunSummary, Swarm, SwarmHandle};
}
