use std::time::Duration;

use super::error::FeedError;

/// Which record shape the feed emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Flat interleaved array of clamped amplitudes in `[0, 1]`.
    #[default]
    Amplitude,
    /// Signed left/right series passed through the spectral compressor.
    Compressed,
}

/// Configuration for a capture loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfiguration {
    /// Maximum number of scalars per emitted record (default: 64).
    pub max_samples: usize,

    /// Sleep between polls (default: 15ms).
    pub interval: Duration,

    pub mode: OutputMode,
}

impl FeedConfiguration {
    pub const DEFAULT_MAX_SAMPLES: usize = 64;
    pub const DEFAULT_INTERVAL_MS: u64 = 15;

    pub fn validate(&self) -> Result<(), FeedError> {
        if self.max_samples == 0 {
            return Err(FeedError::InvalidConfiguration(
                "sample budget must be positive".into(),
            ));
        }
        if self.interval.is_zero() {
            return Err(FeedError::InvalidConfiguration(
                "polling interval must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FeedConfiguration {
    fn default() -> Self {
        Self {
            max_samples: Self::DEFAULT_MAX_SAMPLES,
            interval: Duration::from_millis(Self::DEFAULT_INTERVAL_MS),
            mode: OutputMode::Amplitude,
        }
    }
}
