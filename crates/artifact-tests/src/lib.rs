//! Test support for the artifact transfer engine
//!
//! Provides in-memory providers with scripted faults, an instrumented
//! provider that records transfer concurrency, and logging setup for tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Concurrency testing utilities
///
/// Instrumented providers that record how many items are in flight at once.
pub mod concurrency_utils;

/// Unified test utilities
///
/// In-memory providers and logging setup shared by all test files.
pub mod test_utils;

pub use concurrency_utils::{ConcurrencyProbe, InstrumentedProvider};
pub use test_utils::{init_test_logging, Fault, MemoryProvider};
