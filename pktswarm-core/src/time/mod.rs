//! ## pktswarm-core::time
//! **Event-time scheduling**
//!
//! The wheel's clock only moves when a packet timestamp moves it. There is no wall-clock
//! fallback, so idle periods in a live capture simply leave timers pending until traffic
//! resumes.

pub mod wheel;

pub use wheel::{TimerAction, TimingWheel, WheelError};
