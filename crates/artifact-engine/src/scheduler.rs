//! Bounded worker pool draining the ticket queue
//!
//! `parallelism` workers share one [`TicketStore`]. Each worker claims one
//! ticket at a time and carries it to a terminal state before claiming the
//! next, so the number of in-flight transfers never exceeds the pool size.
//! Workers exit once the queue is empty or the run is cancelled; the pool is
//! done when every worker has exited.

use crate::monitor::StatisticsCollector;
use crate::retry::RetryPolicy;
use crate::store::{TicketId, TicketStore};
use crate::stream::CountingReader;
use crate::ticket::TransferOutcome;
use artifact_types::{
    ArtifactItem, ItemReader, Parallelism, ProgressEvent, ProgressReporter, Provider, Result,
    TicketState,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Message recorded on tickets abandoned by a panicking worker
pub const WORKER_PANIC_MESSAGE: &str = "Transfer worker panicked";

/// Everything the workers of one run share
pub struct RunContext {
    /// Provider items are read from
    pub source: Arc<dyn Provider>,
    /// Provider items are written to
    pub destination: Arc<dyn Provider>,
    /// Tickets of this run
    pub store: Arc<TicketStore>,
    /// Retry policy wrapped around each transfer
    pub retry: RetryPolicy,
    /// Live counters
    pub statistics: Arc<StatisticsCollector>,
    /// Progress sink; `None` disables progress events
    pub reporter: Option<Arc<dyn ProgressReporter>>,
    /// Run cancellation signal
    pub cancel: CancellationToken,
}

impl RunContext {
    fn emit(&self, event: &ProgressEvent) {
        debug!(path = %event.path, state = %event.state, attempt = event.attempt, "Ticket transition");
        if let Some(reporter) = &self.reporter {
            reporter.report_progress(event);
        }
    }

    /// One read+write pair; folders carry no content and are never read.
    async fn transfer_once(&self, item: &ArtifactItem) -> Result<TransferOutcome> {
        self.statistics.record_attempt();

        let mut counter = None;
        let reader: ItemReader = if item.is_folder() {
            Box::new(tokio::io::empty())
        } else {
            let reader = CountingReader::new(self.source.read_item(item).await?);
            counter = Some(reader.counter());
            Box::new(reader)
        };

        let written = self.destination.write_item(item, reader).await?;

        Ok(TransferOutcome {
            bytes_read: counter.map_or(0, |count| count.load(Ordering::Relaxed)),
            bytes_written: written.bytes_written,
            metadata: written.metadata,
        })
    }

    /// Drive one claimed ticket to `Processed` or `Failed`
    async fn process_ticket(&self, id: TicketId, item: &ArtifactItem) {
        let _in_flight = self.statistics.start_transfer();

        let result = self
            .retry
            .execute(
                item.path(),
                &self.cancel,
                move |_| self.transfer_once(item),
                |attempt, error| {
                    warn!(
                        path = %item.path(),
                        attempt,
                        max_retries = self.retry.config().max_retries,
                        error = %error,
                        "Retrying item transfer"
                    );
                    self.statistics.record_retry();
                    let event = self.store.record_retry(id);
                    self.emit(&event);
                },
            )
            .await;

        let event = match result {
            Ok(outcome) => {
                self.statistics
                    .record_bytes(outcome.bytes_read, outcome.bytes_written);
                self.store.complete(id, outcome)
            }
            Err(error) => {
                error!(path = %item.path(), error = %error, "Item transfer failed");
                self.store.fail(id, error.to_string())
            }
        };
        self.emit(&event);
    }
}

async fn worker_loop(run: Arc<RunContext>, worker: usize) {
    debug!(worker, "Worker started");
    loop {
        if run.cancel.is_cancelled() {
            debug!(worker, "Run cancelled, worker stops claiming");
            break;
        }
        let Some((id, item)) = run.store.claim_next() else {
            break;
        };
        run.emit(&ProgressEvent::new(item.path(), TicketState::InProgress, 0));
        run.process_ticket(id, &item).await;
    }
    debug!(worker, "Worker finished");
}

/// Run the worker pool to completion.
///
/// On return every ticket is terminal: tickets never claimed because of
/// cancellation are `Skipped`, and tickets a panicking worker abandoned are
/// `Failed`.
pub async fn run_workers(run: Arc<RunContext>, parallelism: Parallelism) {
    let worker_count = parallelism.get().min(run.store.len());
    let mut workers = JoinSet::new();
    for worker in 0..worker_count {
        workers.spawn(worker_loop(Arc::clone(&run), worker));
    }

    let mut next_worker = worker_count;
    while let Some(joined) = workers.join_next().await {
        if let Err(join_error) = joined {
            error!(error = %join_error, "Transfer worker terminated abnormally");
            // Keep the pool at strength while work remains
            if run.store.pending() > 0 && !run.cancel.is_cancelled() {
                workers.spawn(worker_loop(Arc::clone(&run), next_worker));
                next_worker += 1;
            }
        }
    }

    for event in run.store.skip_pending() {
        run.emit(&event);
    }
    for event in run.store.fail_in_progress(WORKER_PANIC_MESSAGE) {
        run.emit(&event);
    }
}
