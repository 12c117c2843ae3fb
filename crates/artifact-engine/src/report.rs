//! Run summaries built from returned tickets

use crate::monitor::Statistics;
use crate::ticket::TransferTicket;
use artifact_types::TicketState;
use chrono::{DateTime, Utc};
use std::fmt;

/// One failed item in a [`TransferReport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Item path
    pub path: String,
    /// Retries performed before giving up
    pub attempt: u32,
    /// Last error message
    pub error: String,
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferReport {
    /// Number of tickets
    pub total: usize,
    /// Tickets that ended `Processed`
    pub processed: usize,
    /// Tickets that ended `Failed`
    pub failed: usize,
    /// Tickets that ended `Skipped`
    pub skipped: usize,
    /// Bytes read from the source by processed tickets
    pub bytes_downloaded: u64,
    /// Bytes written to the destination by processed tickets
    pub bytes_written: u64,
    /// Earliest ticket start
    pub started_at: Option<DateTime<Utc>>,
    /// Latest ticket end
    pub finished_at: Option<DateTime<Utc>>,
    /// Failed items in listing order
    pub failures: Vec<ItemFailure>,
    /// Live counters captured at the end of the run
    pub statistics: Option<Statistics>,
}

impl TransferReport {
    /// Summarize a ticket list
    pub fn from_tickets(tickets: &[TransferTicket]) -> Self {
        let mut report = Self {
            total: tickets.len(),
            ..Self::default()
        };

        for ticket in tickets {
            match ticket.state {
                TicketState::Processed => {
                    report.processed += 1;
                    report.bytes_downloaded += ticket.download_size_in_bytes;
                    report.bytes_written += ticket.file_size_in_bytes;
                }
                TicketState::Failed => {
                    report.failed += 1;
                    report.failures.push(ItemFailure {
                        path: ticket.path().to_string(),
                        attempt: ticket.attempt,
                        error: ticket.error_message.clone().unwrap_or_default(),
                    });
                }
                TicketState::Skipped => report.skipped += 1,
                TicketState::Pending | TicketState::InProgress => {}
            }
        }

        report.started_at = tickets.iter().filter_map(|t| t.start_time).min();
        report.finished_at = tickets.iter().filter_map(|t| t.end_time).max();
        report
    }

    /// Attach a statistics snapshot
    pub fn with_statistics(mut self, statistics: Statistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// True when no ticket failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Wall-clock span from the first claim to the last completion
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items: {} processed, {} failed, {} skipped ({} bytes written)",
            self.total, self.processed, self.failed, self.skipped, self.bytes_written
        )
    }
}

/// Processed file tickets whose written size differs from the listed size
pub fn verify_consistency(tickets: &[TransferTicket]) -> Vec<&TransferTicket> {
    tickets
        .iter()
        .filter(|ticket| {
            ticket.state == TicketState::Processed
                && ticket.item.is_file()
                && ticket.item.size() != ticket.file_size_in_bytes
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::TransferOutcome;
    use artifact_types::ArtifactItem;

    fn processed(path: &str, size: u64, written: u64) -> TransferTicket {
        let mut ticket = TransferTicket::new(ArtifactItem::file(path, size));
        ticket.start();
        ticket.complete(TransferOutcome {
            bytes_read: written,
            bytes_written: written,
            ..TransferOutcome::default()
        });
        ticket
    }

    fn failed(path: &str) -> TransferTicket {
        let mut ticket = TransferTicket::new(ArtifactItem::file(path, 1));
        ticket.start();
        ticket.record_retry();
        ticket.fail("Write error for 'x': refused");
        ticket
    }

    #[test]
    fn test_report_counts() {
        let mut skipped = TransferTicket::new(ArtifactItem::file("c.txt", 3));
        skipped.skip();
        let tickets = vec![processed("a.txt", 10, 10), failed("b.txt"), skipped];

        let report = TransferReport::from_tickets(&tickets);
        assert_eq!(report.total, 3);
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.bytes_written, 10);
        assert_eq!(report.failures[0].path, "b.txt");
        assert_eq!(report.failures[0].attempt, 1);
        assert!(!report.is_success());
        assert!(report.duration().is_some());
        assert_eq!(
            report.to_string(),
            "3 items: 1 processed, 1 failed, 1 skipped (10 bytes written)"
        );
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = TransferReport::from_tickets(&[]);
        assert!(report.is_success());
        assert!(report.duration().is_none());
    }

    #[test]
    fn test_verify_consistency() {
        let mut folder = TransferTicket::new(ArtifactItem::folder("dir"));
        folder.start();
        folder.complete(TransferOutcome::default());

        let tickets = vec![
            processed("ok.bin", 100, 100),
            processed("short.bin", 100, 60),
            folder,
            failed("broken.bin"),
        ];

        let corrupted = verify_consistency(&tickets);
        assert_eq!(corrupted.len(), 1);
        assert_eq!(corrupted[0].path(), "short.bin");
    }
}
