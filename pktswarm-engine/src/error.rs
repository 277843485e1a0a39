use pktswarm_capture::CaptureError;
use pktswarm_core::CoreError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Flow tracking failed: {0}")]
    Core(#[from] CoreError),

    #[error("Reporting interval must be non-zero")]
    ZeroInterval,

    #[error("Capture task failed: {0}")]
    Task(#[from] JoinError),
}
