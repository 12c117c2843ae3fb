//! Core type system and error handling for the artifact transfer engine
//!
//! This crate provides the foundational types shared by the engine and by
//! provider implementations:
//!
//! - **Item model**: provider-independent description of a file or folder
//! - **Error handling**: error taxonomy with severity and retry classification
//! - **Pattern sets**: glob selection with `*`, `?`, `**` and `!` exclusions
//! - **Traits**: the async [`Provider`] contract and the [`ProgressReporter`] sink
//! - **Configuration**: validated option value types
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use artifact_types::{ArtifactItem, Error, Result};
//!
//! fn pick_files(items: Vec<ArtifactItem>) -> Result<Vec<ArtifactItem>> {
//!     if items.is_empty() {
//!         return Err(Error::listing("source root is empty"));
//!     }
//!     Ok(items.into_iter().filter(ArtifactItem::is_file).collect())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod item;
pub mod pattern;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{Parallelism, RetryConfig};
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use item::{normalize_path, ArtifactItem, ItemMetadata, ItemType, DESTINATION_URL_KEY};
pub use pattern::{Glob, PatternSet, MATCH_ALL};
pub use result::Result;
pub use traits::{ItemReader, ProgressReporter, Provider, WriteOutcome};
pub use types::{ProgressEvent, TicketState};
