//! Download finalization: promote a verified temp file, or clean up after a failure.

use std::io::ErrorKind;

use crate::error::FetchError;
use crate::types::Task;

/// Atomically rename the temp file onto the target path.
///
/// `rename` within one directory is atomic, so an observer of the target path
/// sees either nothing or the complete file.
pub(super) async fn promote(task: &Task) -> Result<(), FetchError> {
    tokio::fs::rename(task.temp_path(), task.target_path()).await?;
    Ok(())
}

/// Best-effort removal of the temp file. Failures are logged, never escalated.
pub(super) async fn discard_temp(task: &Task) {
    match tokio::fs::remove_file(task.temp_path()).await {
        Ok(()) => {
            tracing::debug!(
                identifier = %task.identifier(),
                temp_path = %task.temp_path().display(),
                "Removed partial download"
            );
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::debug!(
                identifier = %task.identifier(),
                temp_path = %task.temp_path().display(),
                error = %e,
                "Failed to remove partial download"
            );
        }
    }
}

/// True when a non-empty file already sits at the target path.
pub(super) async fn already_downloaded(task: &Task) -> bool {
    match tokio::fs::metadata(task.target_path()).await {
        Ok(meta) => meta.len() > 0,
        Err(_) => false,
    }
}
