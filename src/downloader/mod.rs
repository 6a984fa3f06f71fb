//! Core downloader implementation split into focused submodules.
//!
//! The [`BulkDownloader`] engine ties the pieces together:
//! - [`download_task`] - Per-item download state machine
//! - [`pool`] - Bounded worker pool publishing outcomes as they complete
//!
//! Work flows raw pairs → [`dedupe`] → [`Task`]s → worker pool → outcome
//! stream, which the caller (usually a [`Reporter`]) consumes.

mod download_task;
mod pool;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use pool::OutcomeStream;

use std::io::Write;
use std::sync::Arc;

use crate::config::Config;
use crate::dedup::{dedupe, identifier_collisions};
use crate::error::{Error, Result};
use crate::reporter::{Reporter, Summary};
use crate::transport::{Fetcher, HttpTransport};
use crate::types::{Task, WorkItem};

use download_task::DownloadTaskContext;

/// Bulk download engine (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct BulkDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    config: Arc<Config>,
    /// Fetcher and write settings shared by every task
    ctx: Arc<DownloadTaskContext>,
}

impl BulkDownloader {
    /// Create an engine backed by the pooled HTTP transport
    ///
    /// Validates the config, creates the output directory and builds the
    /// HTTP client with one idle connection slot per worker.
    pub async fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(
            &config.http,
            config.retry.clone(),
            config.download.max_concurrent_downloads.max(1),
        )?;
        Self::with_fetcher(config, Arc::new(transport)).await
    }

    /// Create an engine using a custom [`Fetcher`]
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;

        // The only fatal precondition of a run
        tokio::fs::create_dir_all(config.output_dir())
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create output directory '{}': {}",
                        config.output_dir().display(),
                        e
                    ),
                ))
            })?;

        let ctx = DownloadTaskContext::new(fetcher, config.download.chunk_size);
        Ok(Self {
            config: Arc::new(config),
            ctx: Arc::new(ctx),
        })
    }

    /// Get the engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Deduplicate raw pairs and bind each survivor to its output paths.
    ///
    /// Identifier collisions (distinct items that would write the same file)
    /// are logged as warnings but left in place. The pool runs such items one
    /// after another in input order, so the first to succeed keeps the file.
    pub fn prepare<I, T>(&self, items: I) -> Vec<Task>
    where
        I: IntoIterator<Item = T>,
        T: Into<WorkItem>,
    {
        let items: Vec<WorkItem> = items.into_iter().map(Into::into).collect();
        let input = items.len();
        let unique = dedupe(items);

        tracing::info!(
            input,
            unique = unique.len(),
            duplicates = input - unique.len(),
            "Prepared work list"
        );

        for collision in identifier_collisions(&unique) {
            tracing::warn!(
                identifier = %collision.identifier,
                sources = ?collision.source_urls,
                "Several items map to the same output file, running them one after another"
            );
        }

        let output_dir = self.config.output_dir();
        let extension = &self.config.download.file_extension;
        unique
            .iter()
            .map(|item| Task::new(item, output_dir, extension))
            .collect()
    }

    /// Prepare `items` and start downloading them.
    ///
    /// Must be called from within a tokio runtime. Outcomes are yielded in
    /// completion order; the stream ends after the last task finishes.
    pub fn run<I, T>(&self, items: I) -> OutcomeStream
    where
        I: IntoIterator<Item = T>,
        T: Into<WorkItem>,
    {
        let tasks = self.prepare(items);
        self.run_tasks(tasks)
    }

    /// Start downloading already prepared tasks
    pub fn run_tasks(&self, tasks: Vec<Task>) -> OutcomeStream {
        pool::spawn_pool(
            Arc::clone(&self.ctx),
            tasks,
            self.config.download.max_concurrent_downloads,
        )
    }

    /// Run `items` to completion, reporting every outcome through `reporter`
    pub async fn run_with_reporter<I, T, W>(&self, items: I, reporter: &Reporter<W>) -> Summary
    where
        I: IntoIterator<Item = T>,
        T: Into<WorkItem>,
        W: Write,
    {
        reporter.consume(self.run(items)).await
    }
}
