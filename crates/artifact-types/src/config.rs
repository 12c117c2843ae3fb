//! Validated configuration value types
//!
//! These wrap raw option values so the engine never sees an out-of-range
//! parallelism degree or a zero timeout.

use std::time::Duration;

/// Parallelism degree with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parallelism(usize);

impl Parallelism {
    /// Minimum parallelism degree
    pub const MIN: usize = 1;
    /// Maximum parallelism degree
    pub const MAX: usize = 256;
    /// Default parallelism degree
    pub const DEFAULT: usize = 8;

    /// Create a new parallelism degree with validation
    pub fn new(count: usize) -> Result<Self, String> {
        if count < Self::MIN {
            Err(format!("Parallelism {} is below minimum {}", count, Self::MIN))
        } else if count > Self::MAX {
            Err(format!("Parallelism {} exceeds maximum {}", count, Self::MAX))
        } else {
            Ok(Self(count))
        }
    }

    /// Get the parallelism value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Parallelism {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Per-item retry configuration
///
/// The interval is fixed: every retry waits the same amount of time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryConfig {
    /// Maximum number of additional attempts after the first failure
    pub max_retries: u32,
    /// Delay before each retry attempt
    pub interval: Duration,
    /// Upper bound on a single attempt
    pub attempt_timeout: Duration,
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new(max_retries: u32, interval: Duration, attempt_timeout: Duration) -> Result<Self, String> {
        if attempt_timeout.is_zero() {
            return Err("Attempt timeout must be greater than zero".to_string());
        }
        Ok(Self {
            max_retries,
            interval,
            attempt_timeout,
        })
    }

    /// Total number of attempts an always-failing item receives
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the given retry attempt (1-based)
    pub fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        self.interval
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            interval: Duration::from_secs(5),
            attempt_timeout: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallelism_validation() {
        assert!(Parallelism::new(0).is_err());
        assert!(Parallelism::new(1).is_ok());
        assert!(Parallelism::new(256).is_ok());
        assert!(Parallelism::new(257).is_err());
        assert_eq!(Parallelism::default().get(), 8);
    }

    #[test]
    fn test_retry_interval_is_fixed() {
        let retry = RetryConfig::new(3, Duration::from_millis(250), Duration::from_secs(1)).unwrap();
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(250));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(250));
        assert_eq!(retry.max_attempts(), 4);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(RetryConfig::new(1, Duration::ZERO, Duration::ZERO).is_err());
    }
}
