//! Download task execution -- the per-item state machine.
//!
//! Split into focused submodules:
//! - [`context`] - Shared, read-only state every task runs against
//! - [`orchestration`] - Top-level task lifecycle (skip checks, fetch, finalize)
//! - [`streaming`] - Streaming the response body into the temp file
//! - [`finalization`] - Promotion of the temp file and cleanup on failure

mod context;
mod finalization;
mod orchestration;
mod streaming;


pub(crate) use context::DownloadTaskContext;
pub(crate) use orchestration::run_download_task;
