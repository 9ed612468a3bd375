//! Error types for stream hand-off and collection.

use std::time::Duration;

/// The main error type for stream operations.
///
/// Stage constructors never fail; errors only surface where a caller talks to
/// a stream directly (sending into one, or draining one under a timeout).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Every consumer of the stream went away before the value was taken
    #[error("Channel was closed unexpectedly")]
    ChannelClosed,

    /// An operation timed out
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl Error {
    /// Create a timeout error
    pub fn timeout(duration_ms: u64) -> Self {
        Error::Timeout { duration_ms }
    }

    /// Create a timeout error for a limit given as a [`Duration`].
    ///
    /// Limits too long to count in milliseconds saturate at `u64::MAX`.
    pub fn timed_out_after(limit: Duration) -> Self {
        Error::timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;
