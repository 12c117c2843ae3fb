//! Shared data types for ticket state and progress reporting

use std::fmt;

/// State of a transfer ticket
///
/// `Pending -> InProgress -> {Processed, Failed}`, or `Pending -> Skipped` when
/// a run is cancelled before a worker claims the ticket. Retries keep the
/// ticket `InProgress`; it never returns to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TicketState {
    /// Created at enqueue, not yet claimed
    Pending,
    /// Claimed by a worker
    InProgress,
    /// Transferred successfully
    Processed,
    /// Retries exhausted or a non-retryable error occurred
    Failed,
    /// Cancelled before any worker claimed it
    Skipped,
}

impl TicketState {
    /// Returns true if no further transition can occur
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Failed | Self::Skipped)
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::InProgress => "InProgress",
            Self::Processed => "Processed",
            Self::Failed => "Failed",
            Self::Skipped => "Skipped",
        };
        f.write_str(name)
    }
}

/// Progress event emitted on every ticket state transition
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressEvent {
    /// Item path
    pub path: String,
    /// State the ticket moved into
    pub state: TicketState,
    /// Retry attempt counter at the time of the transition
    pub attempt: u32,
}

impl ProgressEvent {
    /// Create a new progress event
    pub fn new(path: impl Into<String>, state: TicketState, attempt: u32) -> Self {
        Self {
            path: path.into(),
            state,
            attempt,
        }
    }
}
