//! Body streaming: fetch the source and write it to the temp path.

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::FetchError;
use crate::types::Task;

use super::context::DownloadTaskContext;

/// Fetch `task.source_url()` and stream the body into `task.temp_path()`.
///
/// Returns the number of bytes written. The temp file is flushed and synced
/// before returning `Ok`, so it is ready to be renamed. On error the temp
/// file may be left behind; the caller owns cleanup.
///
/// A declared length of 0 (or none at all) means the size is unknown and is
/// not verified.
pub(super) async fn stream_to_temp(
    ctx: &DownloadTaskContext,
    task: &Task,
) -> Result<u64, FetchError> {
    let body = ctx.fetcher.get(task.source_url()).await?;
    let expected = body.content_length.filter(|&len| len > 0);

    tracing::debug!(
        identifier = %task.identifier(),
        expected_bytes = ?expected,
        temp_path = %task.temp_path().display(),
        "Streaming response body"
    );

    // Truncate: a stale .part from an interrupted run is discarded, never resumed
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(task.temp_path())
        .await?;
    let mut writer = BufWriter::with_capacity(ctx.chunk_size, file);

    let mut written: u64 = 0;
    let mut chunks = body.chunks;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        if chunk.is_empty() {
            continue;
        }
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;

    if let Some(expected) = expected
        && written != expected
    {
        return Err(FetchError::Incomplete { written, expected });
    }

    writer.into_inner().sync_all().await?;
    Ok(written)
}
