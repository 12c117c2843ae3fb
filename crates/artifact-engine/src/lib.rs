//! Concurrent artifact transfer engine
//!
//! This crate moves a tree of named items from a source [`Provider`] to a
//! destination [`Provider`], each of which may be backed by a filesystem, an
//! HTTP item store or a blob container.
//!
//! # Features
//!
//! - **Bounded concurrency**: a fixed pool of workers, never more than
//!   `parallelism` transfers in flight
//! - **Per-item tickets**: every selected item ends `Processed`, `Failed` or
//!   `Skipped`, with timing, byte counts and the last error
//! - **Retry policy**: fixed-interval retries with a per-attempt timeout;
//!   missing items and permission errors fail immediately
//! - **Cooperative cancellation**: unclaimed items are skipped, in-flight
//!   transfers finish their current attempt
//! - **Reporting**: progress events per transition and a run summary
//!
//! # Examples
//!
//! ```rust,no_run
//! use artifact_engine::{ArtifactEngine, EngineOptions, TransferReport};
//! use artifact_types::Provider;
//! use std::sync::Arc;
//!
//! # async fn example(source: Arc<dyn Provider>, destination: Arc<dyn Provider>) -> artifact_types::Result<()> {
//! let engine = ArtifactEngine::new();
//! let options = EngineOptions::default().with_item_pattern("**/*.zip");
//!
//! let tickets = engine.process_items(source, destination, &options).await?;
//! let report = TransferReport::from_tickets(&tickets);
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod filter;
pub mod monitor;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod store;
pub mod stream;
pub mod ticket;

pub use artifact_config::EngineOptions;
pub use artifact_types::{Provider, TicketState};
pub use engine::{process_items, ArtifactEngine, EngineBuilder};
pub use filter::{select_items, Selection};
pub use monitor::{Statistics, StatisticsCollector, TracingReporter};
pub use report::{verify_consistency, ItemFailure, TransferReport};
pub use retry::RetryPolicy;
pub use store::{TicketId, TicketStore};
pub use stream::CountingReader;
pub use ticket::{TransferOutcome, TransferTicket};
