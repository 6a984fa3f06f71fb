//! Download task context: state shared by every task in a run.

use std::sync::Arc;

use crate::transport::Fetcher;

/// Shared context for download tasks, reducing parameter passing between helpers.
///
/// Read-only once built; workers share it behind an `Arc`.
pub(crate) struct DownloadTaskContext {
    pub(crate) fetcher: Arc<dyn Fetcher>,
    /// Write buffer size for the temp file
    pub(crate) chunk_size: usize,
}

impl DownloadTaskContext {
    pub(crate) fn new(fetcher: Arc<dyn Fetcher>, chunk_size: usize) -> Self {
        Self {
            fetcher,
            chunk_size: chunk_size.max(1),
        }
    }
}
