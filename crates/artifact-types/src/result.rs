//! Result type alias for artifact engine operations

use crate::Error;

/// Result type alias for artifact engine operations
pub type Result<T> = std::result::Result<T, Error>;
