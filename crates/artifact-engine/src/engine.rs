//! Engine entry point

use crate::filter::select_items;
use crate::monitor::{Statistics, StatisticsCollector, TracingReporter};
use crate::retry::RetryPolicy;
use crate::scheduler::{run_workers, RunContext};
use crate::store::TicketStore;
use crate::ticket::TransferTicket;
use artifact_config::EngineOptions;
use artifact_types::{Error, ProgressReporter, Provider, Result, TicketState};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Transfers item trees from a source provider to a destination provider
pub struct ArtifactEngine {
    reporter: Option<Arc<dyn ProgressReporter>>,
    cancel: CancellationToken,
    last_statistics: Mutex<Option<Statistics>>,
}

impl ArtifactEngine {
    /// Create an engine with no progress reporter and its own cancellation token
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    /// Start building an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Signal cancellation to every run of this engine.
    ///
    /// Workers stop claiming tickets, in-flight transfers finish their current
    /// attempt, and unclaimed tickets end `Skipped`. The token stays
    /// cancelled, so later runs skip every item.
    pub fn cancel(&self) {
        info!("Cancellation requested");
        self.cancel.cancel();
    }

    /// Clone of the cancellation token used by this engine
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Counters captured at the end of the most recent run
    pub fn last_statistics(&self) -> Option<Statistics> {
        self.last_statistics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Transfer every selected source item to the destination.
    ///
    /// Returns one ticket per selected item, each in a terminal state. Item
    /// failures are recorded on tickets; only invalid options and a failed
    /// source listing are returned as errors, before any ticket exists.
    pub async fn process_items(
        &self,
        source: Arc<dyn Provider>,
        destination: Arc<dyn Provider>,
        options: &EngineOptions,
    ) -> Result<Vec<TransferTicket>> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "process_items",
            %run_id,
            source = source.name(),
            destination = destination.name(),
            parallelism = options.parallelism,
        );

        self.run(source, destination, options).instrument(span).await
    }

    async fn run(
        &self,
        source: Arc<dyn Provider>,
        destination: Arc<dyn Provider>,
        options: &EngineOptions,
    ) -> Result<Vec<TransferTicket>> {
        let parallelism = options.parallelism()?;
        let retry = RetryPolicy::new(options.retry_config()?);
        let patterns = options.pattern_set()?;

        let hint = (!patterns.is_match_all()).then_some(options.item_pattern.as_str());
        let listing = source.list_items(hint).await.map_err(|error| {
            if error.is_setup_error() {
                error
            } else {
                Error::listing(format!(
                    "Failed to list items from {}: {}",
                    source.name(),
                    error
                ))
            }
        })?;
        if listing.iter().any(|item| item.path().is_empty()) {
            return Err(Error::listing(format!(
                "{} listed an item with an empty path; the root itself is not an item",
                source.name()
            )));
        }
        let listed = listing.len();

        let selection = select_items(listing, &patterns);
        info!(
            listed,
            selected = selection.items.len(),
            excluded = selection.excluded,
            duplicates = selection.duplicates,
            "Starting transfer"
        );

        let reporter = if options.verbose {
            Some(
                self.reporter
                    .clone()
                    .unwrap_or_else(|| Arc::new(TracingReporter)),
            )
        } else {
            None
        };

        let store = Arc::new(TicketStore::new(selection.items));
        let statistics = Arc::new(StatisticsCollector::new());
        let context = Arc::new(RunContext {
            source,
            destination,
            store: Arc::clone(&store),
            retry,
            statistics: Arc::clone(&statistics),
            reporter,
            cancel: self.cancel.clone(),
        });

        run_workers(context, parallelism).await;

        let tickets = store.snapshot();
        let snapshot = statistics.snapshot();
        let count = |state: TicketState| tickets.iter().filter(|t| t.state == state).count();
        info!(
            processed = count(TicketState::Processed),
            failed = count(TicketState::Failed),
            skipped = count(TicketState::Skipped),
            retries = snapshot.retries,
            bytes = snapshot.bytes_written,
            elapsed_ms = snapshot.elapsed.as_millis() as u64,
            "Transfer finished"
        );

        *self
            .last_statistics
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot);

        Ok(tickets)
    }
}

impl Default for ArtifactEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArtifactEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactEngine")
            .field("has_reporter", &self.reporter.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Builder for an [`ArtifactEngine`]
#[derive(Default)]
pub struct EngineBuilder {
    reporter: Option<Arc<dyn ProgressReporter>>,
    cancel: Option<CancellationToken>,
}

impl EngineBuilder {
    /// Create a new engine builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive a progress event on every ticket transition of verbose runs
    pub fn with_progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Use a caller-owned cancellation token
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the engine
    pub fn build(self) -> ArtifactEngine {
        ArtifactEngine {
            reporter: self.reporter,
            cancel: self.cancel.unwrap_or_default(),
            last_statistics: Mutex::new(None),
        }
    }
}

/// Transfer items with a default engine
pub async fn process_items(
    source: Arc<dyn Provider>,
    destination: Arc<dyn Provider>,
    options: &EngineOptions,
) -> Result<Vec<TransferTicket>> {
    ArtifactEngine::new()
        .process_items(source, destination, options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact_types::{ArtifactItem, ItemReader, ProgressEvent, WriteOutcome, DESTINATION_URL_KEY};
    use async_trait::async_trait;
    use std::time::Duration;

    struct Listing(Vec<ArtifactItem>);

    #[async_trait]
    impl Provider for Listing {
        fn name(&self) -> &str {
            "listing"
        }

        async fn list_items(&self, _pattern: Option<&str>) -> Result<Vec<ArtifactItem>> {
            Ok(self.0.clone())
        }

        async fn read_item(&self, item: &ArtifactItem) -> Result<ItemReader> {
            Ok(Box::new(std::io::Cursor::new(vec![0u8; item.size() as usize])))
        }
    }

    struct Unlistable;

    #[async_trait]
    impl Provider for Unlistable {
        async fn list_items(&self, _pattern: Option<&str>) -> Result<Vec<ArtifactItem>> {
            Err(Error::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied)))
        }
    }

    struct UrlSink;

    #[async_trait]
    impl Provider for UrlSink {
        fn name(&self) -> &str {
            "url-sink"
        }

        async fn write_item(&self, item: &ArtifactItem, mut reader: ItemReader) -> Result<WriteOutcome> {
            let written = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
            Ok(WriteOutcome::new(written)
                .with_metadata(DESTINATION_URL_KEY, format!("https://store/{}", item.path())))
        }
    }

    fn options() -> EngineOptions {
        EngineOptions::default()
            .with_parallelism(2)
            .with_retry(0, Duration::from_millis(1))
    }

    fn sample() -> Arc<dyn Provider> {
        Arc::new(Listing(vec![
            ArtifactItem::file("a.txt", 10),
            ArtifactItem::folder("dir"),
            ArtifactItem::file("dir/b.txt", 20),
        ]))
    }

    #[tokio::test]
    async fn test_process_items_scenario() {
        let engine = ArtifactEngine::new();
        let tickets = engine
            .process_items(sample(), Arc::new(UrlSink), &options())
            .await
            .unwrap();

        let paths: Vec<&str> = tickets.iter().map(TransferTicket::path).collect();
        assert_eq!(paths, vec!["a.txt", "dir", "dir/b.txt"]);
        assert!(tickets.iter().all(|t| t.state == TicketState::Processed));
        assert_eq!(
            tickets[2].item.metadata.get(DESTINATION_URL_KEY).map(String::as_str),
            Some("https://store/dir/b.txt")
        );

        let stats = engine.last_statistics().unwrap();
        assert_eq!(stats.bytes_written, 30);
        assert!(stats.peak_in_flight <= 2);
    }

    #[tokio::test]
    async fn test_invalid_options_rejected_before_listing() {
        let result = process_items(sample(), Arc::new(UrlSink), &options().with_parallelism(0)).await;
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_listing_failure_is_setup_error() {
        let result = process_items(Arc::new(Unlistable), Arc::new(UrlSink), &options()).await;
        let error = result.unwrap_err();
        assert!(matches!(error, Error::Listing { .. }));
        assert!(error.is_setup_error());
    }

    #[tokio::test]
    async fn test_listed_root_is_rejected() {
        let source = Arc::new(Listing(vec![
            ArtifactItem::folder("./"),
            ArtifactItem::file("a.txt", 1),
        ]));

        let error = process_items(source, Arc::new(UrlSink), &options())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Listing { .. }));
        assert!(error.to_string().contains("empty path"));
    }

    #[tokio::test]
    async fn test_verbose_run_reports_transitions() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let engine = EngineBuilder::new()
            .with_progress_reporter(Arc::new(move |event: &ProgressEvent| {
                sink.lock().unwrap().push(event.clone());
            }))
            .build();

        engine
            .process_items(sample(), Arc::new(UrlSink), &options().verbose(true))
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(
            events.iter().filter(|e| e.state == TicketState::Processed).count(),
            3
        );
    }

    #[tokio::test]
    async fn test_quiet_run_reports_nothing() {
        let events = Arc::new(Mutex::new(Vec::<ProgressEvent>::new()));
        let sink = Arc::clone(&events);
        let engine = EngineBuilder::new()
            .with_progress_reporter(Arc::new(move |event: &ProgressEvent| {
                sink.lock().unwrap().push(event.clone());
            }))
            .build();

        engine
            .process_items(sample(), Arc::new(UrlSink), &options())
            .await
            .unwrap();
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_engine_skips_all() {
        let token = CancellationToken::new();
        let engine = EngineBuilder::new()
            .with_cancellation_token(token.clone())
            .build();
        token.cancel();

        let tickets = engine
            .process_items(sample(), Arc::new(UrlSink), &options())
            .await
            .unwrap();
        assert_eq!(tickets.len(), 3);
        assert!(tickets.iter().all(|t| t.state == TicketState::Skipped));
        assert!(engine.cancellation_token().is_cancelled());
    }
}
