//! Per-item transfer records

use artifact_types::{ArtifactItem, ItemMetadata, TicketState};
use chrono::{DateTime, Utc};

/// What one successful transfer attempt produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Bytes pulled from the source stream
    pub bytes_read: u64,
    /// Bytes the destination reports as written
    pub bytes_written: u64,
    /// Destination metadata to merge into the item
    pub metadata: ItemMetadata,
}

/// The mutable record of one item's transfer progress and outcome
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransferTicket {
    /// Item being transferred; only its metadata changes, on success
    pub item: ArtifactItem,
    /// Current state
    pub state: TicketState,
    /// Number of retries performed so far
    pub attempt: u32,
    /// When a worker claimed the ticket
    pub start_time: Option<DateTime<Utc>>,
    /// When the ticket reached `Processed` or `Failed`
    pub end_time: Option<DateTime<Utc>>,
    /// Last error, set when the ticket failed
    pub error_message: Option<String>,
    /// Bytes read from the source by the successful attempt
    pub download_size_in_bytes: u64,
    /// Bytes the destination reported as written
    pub file_size_in_bytes: u64,
}

impl TransferTicket {
    /// Create a pending ticket for an item
    pub fn new(item: ArtifactItem) -> Self {
        Self {
            item,
            state: TicketState::Pending,
            attempt: 0,
            start_time: None,
            end_time: None,
            error_message: None,
            download_size_in_bytes: 0,
            file_size_in_bytes: 0,
        }
    }

    /// Item path
    pub fn path(&self) -> &str {
        self.item.path()
    }

    /// Mark the ticket as claimed by a worker
    pub fn start(&mut self) {
        self.state = TicketState::InProgress;
        self.start_time = Some(Utc::now());
    }

    /// Count one more retry; the ticket stays `InProgress`
    pub fn record_retry(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Mark the ticket as transferred and merge destination metadata
    pub fn complete(&mut self, outcome: TransferOutcome) {
        self.state = TicketState::Processed;
        self.end_time = Some(Utc::now());
        self.download_size_in_bytes = outcome.bytes_read;
        self.file_size_in_bytes = outcome.bytes_written;
        self.item.metadata.extend(outcome.metadata);
    }

    /// Mark the ticket as failed
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = TicketState::Failed;
        self.end_time = Some(Utc::now());
        self.error_message = Some(message.into());
    }

    /// Mark a never-claimed ticket as skipped
    pub fn skip(&mut self) {
        self.state = TicketState::Skipped;
    }

    /// Check if the ticket reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Time between claim and completion
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}
