use std::time::Duration;

use thiserror::Error;

use crate::time::WheelError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Flow timeout {timeout:?} does not fit the timing wheel horizon {horizon:?}")]
    TimeoutExceedsHorizon { timeout: Duration, horizon: Duration },

    #[error("Timing wheel capacity error: {0}")]
    Capacity(#[from] WheelError),
}
