use super::error::FeedError;

/// Why a capture loop left the running state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A stop was requested through the stop signal.
    Requested,
    /// The record consumer went away (broken pipe).
    OutputClosed,
    Failed(FeedError),
}

/// Capture loop state machine.
///
/// ```text
/// running → stopped(requested | output closed | failed)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped(StopReason),
}

impl LoopState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }

    /// The error that stopped the loop, if it failed.
    pub fn failure(&self) -> Option<&FeedError> {
        match self {
            Self::Stopped(StopReason::Failed(e)) => Some(e),
            _ => None,
        }
    }
}

/// Counters reported when a capture loop finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub polls: u64,
    pub empty_polls: u64,
    pub records_emitted: u64,
    pub packets_dropped: u64,
}
