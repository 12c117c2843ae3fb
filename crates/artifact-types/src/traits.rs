//! Core traits for the artifact engine
//!
//! [`Provider`] is the capability interface every source and destination
//! implements. A single run may read from one kind of provider and write to
//! another (filesystem to HTTP, HTTP to filesystem, filesystem to blob).

use crate::{ArtifactItem, Error, ItemMetadata, ProgressEvent, Result};
use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Byte stream carrying an item's content from a source to a destination
pub type ItemReader = Box<dyn AsyncRead + Send + Unpin>;

/// What a destination reports after writing an item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Bytes persisted at the destination
    pub bytes_written: u64,
    /// Provider-specific metadata merged into the ticket's item (final URL, ...)
    pub metadata: ItemMetadata,
}

impl WriteOutcome {
    /// Create an outcome with no extra metadata
    pub fn new(bytes_written: u64) -> Self {
        Self {
            bytes_written,
            metadata: ItemMetadata::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Pluggable adapter over a concrete backend
///
/// Providers are set up by the caller before a run and must be usable from
/// several workers at once. Every method has a default that rejects the call,
/// so a pure source only implements `list_items`/`read_item` and a pure
/// destination only implements `write_item`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short human-readable name used in log output
    fn name(&self) -> &str {
        "provider"
    }

    /// Enumerate the items below the provider root.
    ///
    /// Folders must be returned before the files they contain. The root
    /// itself is never listed: every item needs a non-empty path after
    /// normalization, otherwise the run fails with [`Error::Listing`].
    /// `pattern` is a hint; the engine applies the same pattern again after
    /// listing.
    async fn list_items(&self, _pattern: Option<&str>) -> Result<Vec<ArtifactItem>> {
        Err(Error::listing(format!(
            "{} cannot be used as a source",
            self.name()
        )))
    }

    /// Open an item's content for reading.
    ///
    /// Fails with [`Error::ItemNotFound`] if the item disappeared after listing.
    async fn read_item(&self, item: &ArtifactItem) -> Result<ItemReader> {
        Err(Error::read(
            item.path(),
            format!("{} does not support reads", self.name()),
        ))
    }

    /// Write an item's content, creating intermediate folders as needed.
    ///
    /// An existing item at the same path is overwritten, never appended to.
    async fn write_item(&self, item: &ArtifactItem, _reader: ItemReader) -> Result<WriteOutcome> {
        Err(Error::write(
            item.path(),
            format!("{} does not support writes", self.name()),
        ))
    }
}

/// Sink for per-transition progress events
pub trait ProgressReporter: Send + Sync {
    /// Report a ticket state transition
    fn report_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}
