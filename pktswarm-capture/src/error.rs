use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to open capture on {source_name}: {error}")]
    Open {
        source_name: String,
        #[source]
        error: pcap::Error,
    },

    #[error("Invalid capture filter '{filter}': {error}")]
    Filter {
        filter: String,
        #[source]
        error: pcap::Error,
    },

    #[error("Unsupported data link type {0}")]
    UnsupportedLinkType(i32),

    #[error("Capture read failed: {0}")]
    Read(#[from] pcap::Error),
}
