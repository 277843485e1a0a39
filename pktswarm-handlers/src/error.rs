use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("Unknown handler '{0}' (available: BasicStats, DistPktSize, SessionCount)")]
    UnknownHandler(String),

    #[error("No handlers selected")]
    NoHandlers,
}
