//! Engine-level tests: the worker pool and full runs over a scripted fetcher.


use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use super::BulkDownloader;
use super::test_helpers::{Script, ScriptedFetcher, create_test_downloader, dir_entries};
use crate::error::FetchError;
use crate::types::{Outcome, OutcomeKind, SkipReason};

/// `n` distinct pairs whose source URLs all answer with a small body
fn numbered_items(n: usize) -> (ScriptedFetcher, Vec<(String, String)>) {
    let mut fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(20));
    let mut items = Vec::with_capacity(n);
    for i in 0..n {
        let source = format!("https://cdn.example/v/{i}");
        fetcher = fetcher.with(&source, Script::ok(64));
        items.push((format!("https://ref.example/d/gen_{i}"), source));
    }
    (fetcher, items)
}

async fn collect(downloader: &BulkDownloader, items: Vec<(String, String)>) -> Vec<Outcome> {
    downloader.run(items).collect().await
}
