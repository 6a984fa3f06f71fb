//! Console reporting for a run.
//!
//! The reporter prints one line per outcome as it arrives and a summary once
//! the outcome stream ends:
//!
//! ```text
//! [OK] abc: downloads/abc.mp4
//! [SKIP] def: no source URL
//!
//! Done.
//! Success: 1 | Failed: 0 | Skipped: 1 | Elapsed: 0.4s
//! ```
//!
//! Lines go to a mutex-guarded sink, so concurrent callers never interleave
//! partial lines. Each outcome is also emitted as a `tracing` event.

use std::io::{Stdout, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};

use crate::types::{Outcome, OutcomeKind};

/// Final counts of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Files downloaded and promoted
    pub succeeded: u64,
    /// Tasks that ended in a failure
    pub failed: u64,
    /// Tasks skipped (no source URL or already downloaded)
    pub skipped: u64,
    /// Wall time since the reporter was created
    pub elapsed: Duration,
}

impl Summary {
    /// Number of outcomes recorded
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed + self.skipped
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Success: {} | Failed: {} | Skipped: {} | Elapsed: {:.1}s",
            self.succeeded,
            self.failed,
            self.skipped,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Aggregates outcomes into counters and console lines
pub struct Reporter<W: Write = Stdout> {
    sink: Mutex<W>,
    succeeded: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    started: Instant,
}

impl Reporter<Stdout> {
    /// Reporter writing to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    /// Reporter writing to `sink`; the elapsed clock starts now
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Write a free-form line (banners, notices)
    pub fn line(&self, text: &str) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        // A closed stdout must not turn into a failed run
        let _ = writeln!(sink, "{text}");
    }

    /// Count `outcome` and print its line
    pub fn record(&self, outcome: &Outcome) {
        match &outcome.kind {
            OutcomeKind::Success { path } => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    identifier = %outcome.identifier,
                    path = %path.display(),
                    "Downloaded"
                );
            }
            OutcomeKind::Failed { error } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(identifier = %outcome.identifier, error = %error, "Failed");
            }
            OutcomeKind::Skipped { reason } => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                tracing::info!(identifier = %outcome.identifier, reason = %reason, "Skipped");
            }
        }
        self.line(&outcome.to_string());
    }

    /// Record every outcome of `outcomes` as it arrives, then print the summary
    pub async fn consume<S>(&self, outcomes: S) -> Summary
    where
        S: Stream<Item = Outcome>,
    {
        let mut outcomes = std::pin::pin!(outcomes);
        while let Some(outcome) = outcomes.next().await {
            self.record(&outcome);
        }
        self.finish()
    }

    /// Counts so far
    pub fn summary(&self) -> Summary {
        Summary {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }

    /// Print the closing block and return the final counts
    pub fn finish(&self) -> Summary {
        let summary = self.summary();
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(sink);
        let _ = writeln!(sink, "Done.");
        let _ = writeln!(sink, "{summary}");
        let _ = sink.flush();

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Run finished"
        );
        summary
    }

    /// Recover the sink
    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
