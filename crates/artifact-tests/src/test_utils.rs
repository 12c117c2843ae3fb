//! In-memory providers and logging setup shared by engine tests

use artifact_types::{
    ArtifactItem, Error, ItemReader, Provider, Result, WriteOutcome, DESTINATION_URL_KEY,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::{Mutex, Once};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Install a `tracing` subscriber writing through the test harness.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Safe to call from
/// every test; only the first call installs anything.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Scripted misbehavior for one item path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The first `n` reads fail with a read error
    FailReads(u32),
    /// The first `n` writes fail with a write error
    FailWrites(u32),
    /// Every write fails
    AlwaysFailWrites,
    /// The first `n` writes fail with a plain I/O error of the given kind
    FailWritesIo(u32, io::ErrorKind),
    /// The item is listed but reading reports it missing
    NotFound,
    /// Reading is refused
    PermissionDenied,
    /// Reads stall for the given duration before returning content
    SlowRead(Duration),
}

#[derive(Debug, Default)]
struct Counters {
    reads: HashMap<String, u32>,
    writes: HashMap<String, u32>,
}

/// Provider backed by memory, usable as source and destination
///
/// Listing returns items in insertion order, so tests control folder-before-
/// file ordering explicitly.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    name: String,
    listing: Vec<ArtifactItem>,
    contents: Mutex<BTreeMap<String, Vec<u8>>>,
    faults: HashMap<String, Fault>,
    counters: Mutex<Counters>,
    listing_error: Option<String>,
}

impl MemoryProvider {
    /// Create an empty provider
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// List a file with the given content; the listed size is the content length
    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        let item = ArtifactItem::file(path, content.len() as u64);
        self.with_item(item, content)
    }

    /// List a folder
    pub fn with_folder(self, path: &str) -> Self {
        self.with_item(ArtifactItem::folder(path), Vec::new())
    }

    /// List an arbitrary item with the given content
    pub fn with_item(mut self, item: ArtifactItem, content: impl Into<Vec<u8>>) -> Self {
        if let Ok(contents) = self.contents.get_mut() {
            contents.insert(item.path().to_string(), content.into());
        }
        self.listing.push(item);
        self
    }

    /// Script a fault for a path
    pub fn with_fault(mut self, path: &str, fault: Fault) -> Self {
        self.faults.insert(path.to_string(), fault);
        self
    }

    /// Make `list_items` fail
    pub fn with_listing_error(mut self, message: impl Into<String>) -> Self {
        self.listing_error = Some(message.into());
        self
    }

    /// Number of `read_item` calls for a path
    pub fn read_attempts(&self, path: &str) -> u32 {
        self.counters().reads.get(path).copied().unwrap_or(0)
    }

    /// Number of `write_item` calls for a path
    pub fn write_attempts(&self, path: &str) -> u32 {
        self.counters().writes.get(path).copied().unwrap_or(0)
    }

    /// Stored content for a path
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.lock_contents().get(path).cloned()
    }

    /// Every stored path, sorted
    pub fn stored_paths(&self) -> Vec<String> {
        self.lock_contents().keys().cloned().collect()
    }

    fn counters(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_contents(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.contents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn bump(map: &mut HashMap<String, u32>, path: &str) -> u32 {
        let count = map.entry(path.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_items(&self, _pattern: Option<&str>) -> Result<Vec<ArtifactItem>> {
        match &self.listing_error {
            Some(message) => Err(Error::listing(message.clone())),
            None => Ok(self.listing.clone()),
        }
    }

    async fn read_item(&self, item: &ArtifactItem) -> Result<ItemReader> {
        let path = item.path();
        let call = Self::bump(&mut self.counters().reads, path);
        let fault = self.faults.get(path);
        if let Some(fault) = fault {
            debug!(provider = %self.name, path, call, ?fault, "Read with scripted fault");
        }

        match fault {
            Some(Fault::NotFound) => return Err(Error::item_not_found(path)),
            Some(Fault::PermissionDenied) => {
                return Err(Error::PermissionDenied {
                    path: path.to_string(),
                })
            }
            Some(Fault::FailReads(n)) if call <= *n => {
                return Err(Error::read(path, format!("simulated read failure {}", call)))
            }
            Some(Fault::SlowRead(delay)) => tokio::time::sleep(*delay).await,
            _ => {}
        }

        let content = self
            .content(path)
            .ok_or_else(|| Error::item_not_found(path))?;
        Ok(Box::new(std::io::Cursor::new(content)))
    }

    async fn write_item(&self, item: &ArtifactItem, mut reader: ItemReader) -> Result<WriteOutcome> {
        let path = item.path();
        let call = Self::bump(&mut self.counters().writes, path);

        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .await
            .map_err(|e| Error::from_write_io(path, &e))?;

        let fault = self.faults.get(path);
        if let Some(fault) = fault {
            debug!(provider = %self.name, path, call, ?fault, "Write with scripted fault");
        }

        match fault {
            Some(Fault::AlwaysFailWrites) => {
                return Err(Error::write(path, "simulated permanent write failure"))
            }
            Some(Fault::FailWritesIo(n, kind)) if call <= *n => simulated_io_failure(*kind)?,
            Some(Fault::FailWrites(n)) if call <= *n => {
                return Err(Error::write(path, format!("simulated write failure {}", call)))
            }
            _ => {}
        }

        let written = content.len() as u64;
        self.lock_contents().insert(path.to_string(), content);

        Ok(WriteOutcome::new(written)
            .with_metadata(DESTINATION_URL_KEY, format!("memory://{}/{}", self.name, path)))
    }
}

fn simulated_io_failure(kind: io::ErrorKind) -> io::Result<()> {
    Err(io::Error::new(kind, "connection dropped"))
}
