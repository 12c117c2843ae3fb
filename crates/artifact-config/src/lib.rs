//! Engine options and configuration loading for the artifact transfer engine
//!
//! [`EngineOptions`] is the single options object handed to
//! `ArtifactEngine::process_items`. It can be built in code or loaded from
//! layered sources (defaults, YAML/TOML/JSON files, environment variables).
//!
//! # Examples
//!
//! ```rust
//! use artifact_config::EngineOptions;
//! use std::time::Duration;
//!
//! let options = EngineOptions::default()
//!     .with_parallelism(4)
//!     .with_item_pattern("**/*.zip")
//!     .with_retry(2, Duration::from_millis(500));
//!
//! options.validate().expect("valid options");
//! assert_eq!(options.parallelism().unwrap().get(), 4);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use artifact_types::{Parallelism, PatternSet, RetryConfig, MATCH_ALL};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Default environment variable prefix
pub const DEFAULT_ENV_PREFIX: &str = "ARTIFACT_ENGINE";

/// Options recognized by the transfer engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Maximum number of simultaneous item transfers
    pub parallelism: usize,
    /// Newline-separated globs selecting items; `!` lines exclude
    pub item_pattern: String,
    /// Additional attempts allowed after the first failure
    pub retry_count: u32,
    /// Fixed delay before each retry, in milliseconds
    pub retry_interval_ms: u64,
    /// Upper bound on a single item transfer attempt, in milliseconds
    pub file_timeout_ms: u64,
    /// Emit a progress event on every ticket state transition
    pub verbose: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            parallelism: Parallelism::DEFAULT,
            item_pattern: MATCH_ALL.to_string(),
            retry_count: 4,
            retry_interval_ms: 5_000,
            file_timeout_ms: 5 * 60 * 1000,
            verbose: false,
        }
    }
}

impl EngineOptions {
    /// Set the parallelism degree
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set the item pattern
    pub fn with_item_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.item_pattern = pattern.into();
        self
    }

    /// Set the retry count and the fixed retry interval
    pub fn with_retry(mut self, retry_count: u32, interval: Duration) -> Self {
        self.retry_count = retry_count;
        self.retry_interval_ms = duration_to_millis(interval);
        self
    }

    /// Set the per-item timeout
    pub fn with_file_timeout(mut self, timeout: Duration) -> Self {
        self.file_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Enable or disable per-transition progress events
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validated parallelism degree
    pub fn parallelism(&self) -> ConfigResult<Parallelism> {
        Parallelism::new(self.parallelism).map_err(ConfigError::validation)
    }

    /// Retry policy settings derived from these options
    pub fn retry_config(&self) -> ConfigResult<RetryConfig> {
        RetryConfig::new(
            self.retry_count,
            Duration::from_millis(self.retry_interval_ms),
            Duration::from_millis(self.file_timeout_ms),
        )
        .map_err(ConfigError::validation)
    }

    /// Compiled item pattern
    pub fn pattern_set(&self) -> ConfigResult<PatternSet> {
        PatternSet::parse(&self.item_pattern).map_err(|e| ConfigError::validation(e.to_string()))
    }

    /// Validate every option
    pub fn validate(&self) -> ConfigResult<()> {
        self.parallelism()?;
        self.retry_config()?;
        self.pattern_set()?;
        Ok(())
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
