//! Download task orchestration: top-level lifecycle for a single download.

use crate::types::{Outcome, SkipReason, Task};

use super::context::DownloadTaskContext;
use super::finalization::{already_downloaded, discard_temp, promote};
use super::streaming::stream_to_temp;

/// Core download task -- runs one task to exactly one terminal [`Outcome`].
///
/// Phases:
/// 1. Skip items without a source URL (no I/O)
/// 2. Skip items whose target file already exists and is non-empty
/// 3. Fetch and stream the body into the temp file, verifying the byte count
/// 4. Promote the temp file to the target path
///
/// Every failure is converted into [`Outcome`]; the temp file is removed on
/// each failure path. Nothing in here retries: the transport already did.
pub(crate) async fn run_download_task(ctx: &DownloadTaskContext, task: &Task) -> Outcome {
    let identifier = task.identifier();

    // Phase 1: nothing to fetch
    if task.source_url().is_empty() {
        return Outcome::skipped(identifier, SkipReason::NoSourceUrl);
    }

    // Phase 2: completed by an earlier run
    if already_downloaded(task).await {
        tracing::debug!(
            identifier = %identifier,
            target = %task.target_path().display(),
            "Target already present, skipping"
        );
        return Outcome::skipped(identifier, SkipReason::AlreadyDownloaded);
    }

    // Phase 3: fetch into the temp file
    let written = match stream_to_temp(ctx, task).await {
        Ok(written) => written,
        Err(e) => {
            tracing::warn!(identifier = %identifier, error = %e, "Download failed");
            discard_temp(task).await;
            return Outcome::failed(identifier, e);
        }
    };

    // Phase 4: make it visible under its final name
    if let Err(e) = promote(task).await {
        tracing::warn!(identifier = %identifier, error = %e, "Failed to promote download");
        discard_temp(task).await;
        return Outcome::failed(identifier, e);
    }

    tracing::info!(
        identifier = %identifier,
        bytes = written,
        target = %task.target_path().display(),
        "Download complete"
    );
    Outcome::success(identifier, task.target_path().to_path_buf())
}
