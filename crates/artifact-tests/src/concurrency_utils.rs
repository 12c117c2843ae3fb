//! Concurrency instrumentation for engine tests
//!
//! [`InstrumentedProvider`] stands in for both ends of a run: it reads from
//! one inner provider, writes to another, and tracks every item from the
//! start of its read to the end of its write. The probe records the
//! in-flight high-water mark and any item that was in flight twice at once.

use artifact_types::{ArtifactItem, ItemReader, Provider, Result, WriteOutcome};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Records how many items are in flight at once
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    active: Mutex<HashSet<String>>,
    peak: AtomicUsize,
    overlaps: AtomicUsize,
    completed: AtomicUsize,
}

impl ConcurrencyProbe {
    /// Create an idle probe
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&self, path: &str) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(path.to_string()) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.peak.fetch_max(active.len(), Ordering::SeqCst);
    }

    fn ensure_entered(&self, path: &str) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.insert(path.to_string());
        self.peak.fetch_max(active.len(), Ordering::SeqCst);
    }

    fn exit(&self, path: &str) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
    }

    /// Highest number of items observed in flight at once
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Times an item entered while already in flight
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    /// Items currently in flight
    pub fn in_flight(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Successful writes observed
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

/// Source and destination in one, with an artificial per-item delay
pub struct InstrumentedProvider {
    source: Arc<dyn Provider>,
    destination: Arc<dyn Provider>,
    probe: Arc<ConcurrencyProbe>,
    delay: Duration,
}

impl InstrumentedProvider {
    /// Wrap a source and a destination; every read waits `delay` first
    pub fn new(source: Arc<dyn Provider>, destination: Arc<dyn Provider>, delay: Duration) -> Self {
        Self {
            source,
            destination,
            probe: Arc::new(ConcurrencyProbe::new()),
            delay,
        }
    }

    /// Shared handle on the probe
    pub fn probe(&self) -> Arc<ConcurrencyProbe> {
        Arc::clone(&self.probe)
    }
}

#[async_trait]
impl Provider for InstrumentedProvider {
    fn name(&self) -> &str {
        "instrumented"
    }

    async fn list_items(&self, pattern: Option<&str>) -> Result<Vec<ArtifactItem>> {
        self.source.list_items(pattern).await
    }

    async fn read_item(&self, item: &ArtifactItem) -> Result<ItemReader> {
        self.probe.enter(item.path());
        tokio::time::sleep(self.delay).await;
        let result = self.source.read_item(item).await;
        if result.is_err() {
            self.probe.exit(item.path());
        }
        result
    }

    async fn write_item(&self, item: &ArtifactItem, reader: ItemReader) -> Result<WriteOutcome> {
        // Folders are never read, so they enter here
        self.probe.ensure_entered(item.path());
        let result = self.destination.write_item(item, reader).await;
        if result.is_ok() {
            self.probe.completed.fetch_add(1, Ordering::SeqCst);
        }
        self.probe.exit(item.path());
        result
    }
}
