//! Error types and handling for the artifact engine
//!
//! Errors fall into two groups. Item-level errors (`Read`, `Write`, `Timeout`,
//! `ItemNotFound`, ...) are recovered by the engine into ticket state and never
//! escape a run. Setup errors (`Listing`, `Config`) abort a run before any
//! ticket exists and are the only errors a caller of `process_items` sees.

use std::io;

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - operation can continue
    Low,
    /// Medium severity - operation should be retried
    Medium,
    /// High severity - the item cannot be transferred
    High,
    /// Critical severity - the whole run cannot start
    Critical,
}

/// Main error type for artifact engine operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// I/O operation failed outside of a specific item read or write
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
        /// The item is missing or access is refused; retrying cannot help
        permanent: bool,
    },

    /// The item disappeared between listing and read
    #[error("Item not found: {path}")]
    ItemNotFound {
        /// Provider-relative path of the missing item
        path: String,
    },

    /// Permission denied
    #[error("Permission denied: {path}")]
    PermissionDenied {
        /// Provider-relative path of the item
        path: String,
    },

    /// Reading an item from the source failed
    #[error("Failed to read '{path}': {message}")]
    Read {
        /// Provider-relative path of the item
        path: String,
        /// Error message describing the read failure
        message: String,
    },

    /// Writing an item to the destination failed
    #[error("Failed to write '{path}': {message}")]
    Write {
        /// Provider-relative path of the item
        path: String,
        /// Error message describing the write failure
        message: String,
    },

    /// A single item transfer exceeded the per-item timeout
    #[error("Transfer of '{path}' timed out after {millis} ms")]
    Timeout {
        /// Provider-relative path of the item
        path: String,
        /// Timeout that elapsed, in milliseconds
        millis: u64,
    },

    /// The source root could not be enumerated
    #[error("Listing failed: {message}")]
    Listing {
        /// Error message describing the listing failure
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Operation cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Generic I/O errors
    Io,
    /// Missing item
    NotFound,
    /// Access denied
    PermissionDenied,
    /// Source read errors
    Read,
    /// Destination write errors
    Write,
    /// Per-item timeout
    Timeout,
    /// Source enumeration errors
    Listing,
    /// Configuration errors
    Config,
    /// Cancellation
    Cancelled,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::ItemNotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Read { .. } => ErrorKind::Read,
            Self::Write { .. } => ErrorKind::Write,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Listing { .. } => ErrorKind::Listing,
            Self::Config { .. } => ErrorKind::Config,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io { permanent: true, .. } => ErrorSeverity::High,
            Self::Io { .. } => ErrorSeverity::Medium,
            Self::ItemNotFound { .. } | Self::PermissionDenied { .. } => ErrorSeverity::High,
            Self::Read { .. } | Self::Write { .. } => ErrorSeverity::Medium,
            Self::Timeout { .. } => ErrorSeverity::Medium,
            Self::Listing { .. } => ErrorSeverity::Critical,
            Self::Config { .. } => ErrorSeverity::High,
            Self::Cancelled => ErrorSeverity::Low,
            Self::Other { .. } => ErrorSeverity::Medium,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io { permanent, .. } => !permanent,
            Self::Read { .. } | Self::Write { .. } | Self::Timeout { .. } | Self::Other { .. } => {
                true
            }
            Self::ItemNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::Listing { .. }
            | Self::Config { .. }
            | Self::Cancelled => false,
        }
    }

    /// Check if this error should trigger a retry
    pub fn should_retry(&self) -> bool {
        self.is_recoverable() && self.severity() <= ErrorSeverity::Medium
    }

    /// Check if this error prevents a run from starting
    pub fn is_setup_error(&self) -> bool {
        matches!(self, Self::Listing { .. } | Self::Config { .. })
    }

    /// Create a new item-not-found error
    pub fn item_not_found<S: Into<String>>(path: S) -> Self {
        Self::ItemNotFound { path: path.into() }
    }

    /// Create a new read error
    pub fn read<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Read {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new write error
    pub fn write<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Write {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new listing error
    pub fn listing<S: Into<String>>(message: S) -> Self {
        Self::Listing {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Map an I/O failure that happened while reading `path` from a source.
    pub fn from_read_io<P: Into<String>>(path: P, error: &io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            io::ErrorKind::NotFound => Self::ItemNotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Read {
                path,
                message: error.to_string(),
            },
        }
    }

    /// Map an I/O failure that happened while writing `path` to a destination.
    pub fn from_write_io<P: Into<String>>(path: P, error: &io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Write {
                path,
                message: error.to_string(),
            },
        }
    }
}

/// Any I/O failure may clear on a later attempt except a missing item or a
/// refused access.
impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Io {
            permanent: matches!(
                error.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ),
            message: error.to_string(),
        }
    }
}
