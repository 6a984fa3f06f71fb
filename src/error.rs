//! Error types for bulk-dl
//!
//! Two layers of errors live here:
//! - [`Error`] - crate-level failures that abort setup (bad config, output
//!   directory cannot be created, unreadable work list)
//! - [`FetchError`] - the closed set of reasons a single download can fail.
//!   These never abort a run; they are captured into an
//!   [`Outcome`](crate::types::Outcome) at the task boundary.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for bulk-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bulk-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "output_dir")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (config or work list files)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Fetch error surfaced outside of a download task (transport construction)
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Reasons a single download can fail.
///
/// The `Display` output of each variant is the detail text printed on the
/// `[FAIL]` line for that download.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused/reset, DNS failure, or the body stream broke mid-transfer
    #[error("{0}")]
    Connection(#[source] reqwest::Error),

    /// No response head or body chunk arrived within the read timeout
    #[error("timed out after {}s waiting for data", .0.as_secs_f64())]
    Timeout(Duration),

    /// Final HTTP status of the request (after any retries)
    #[error("{}", describe_status(.0))]
    Status(u16),

    /// The stream ended before the declared `Content-Length` was reached (or overshot it)
    #[error("Incomplete download ({written}/{expected})")]
    Incomplete {
        /// Bytes actually written to the temp file
        written: u64,
        /// Bytes declared by the server
        expected: u64,
    },

    /// Filesystem error while writing or promoting the file
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The download task panicked or was cancelled before producing a result
    #[error("download task aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Human-readable text for a failing status.
///
/// 403 gets its own wording because time-limited signed URLs are the usual cause.
fn describe_status(code: &u16) -> String {
    match *code {
        403 => "403 Forbidden (signed URL may be expired)".to_string(),
        other => format!("HTTP {}", other),
    }
}
