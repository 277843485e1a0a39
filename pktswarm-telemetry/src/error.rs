use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to install log subscriber: {0}")]
    Subscriber(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
