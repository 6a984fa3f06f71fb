//! # bulk-dl
//!
//! Concurrent bulk downloader for lists of HTTP(S) sources.
//!
//! ## Design Philosophy
//!
//! bulk-dl is designed to be:
//! - **Safe to re-run** - Finished files are skipped, partial ones never appear under their final name
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Library-first** - The `bulk-dl` binary is a thin wrapper around [`BulkDownloader`]
//! - **Streaming** - Outcomes are yielded as downloads finish, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use bulk_dl::{BulkDownloader, Config, Reporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.download.output_dir = "videos".into();
//!
//!     let downloader = BulkDownloader::new(config).await?;
//!
//!     let items = [
//!         ("https://example.com/d/gen_01", "https://cdn.example.com/v/01.mp4"),
//!         ("https://example.com/d/gen_02", ""),
//!     ];
//!     let summary = downloader
//!         .run_with_reporter(items, &Reporter::stdout())
//!         .await;
//!
//!     println!("{} succeeded", summary.succeeded);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Work list deduplication
pub mod dedup;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Console reporting of outcomes
pub mod reporter;
/// Retry logic with exponential backoff
pub mod retry;
/// HTTP transport
pub mod transport;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, DownloadConfig, HttpConfig, RetryConfig};
pub use dedup::{IdentifierCollision, dedupe, identifier_collisions};
pub use downloader::{BulkDownloader, OutcomeStream};
pub use error::{Error, FetchError, Result};
pub use reporter::{Reporter, Summary};
pub use transport::{Fetcher, HttpTransport, ResponseBody};
pub use types::{Outcome, OutcomeKind, SkipReason, Task, WorkItem, derive_identifier};
