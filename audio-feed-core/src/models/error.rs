use thiserror::Error;

/// Errors that can occur while binding the loopback stream or feeding records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("no default render endpoint available")]
    DeviceUnavailable,

    #[error("loopback activation failed: {0}")]
    ActivationFailed(String),

    #[error("unsupported stream format: {0}")]
    FormatUnsupported(String),

    #[error("loopback stream failed: {0}")]
    StreamFailed(String),

    #[error("failed to acquire buffer: {0}")]
    BufferAcquireFailed(String),

    #[error("failed to release buffer: {0}")]
    BufferReleaseFailed(String),

    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("output failed: {0}")]
    OutputFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl FeedError {
    /// Whether the capture loop may drop the current packet and keep going.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::BufferAcquireFailed(_) | Self::BufferReleaseFailed(_) | Self::MalformedPacket(_)
        )
    }
}
