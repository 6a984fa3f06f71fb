//! Shared test helpers: a scripted [`Fetcher`] and engine constructors.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::sync::Notify;

use crate::config::Config;
use crate::downloader::BulkDownloader;
use crate::error::FetchError;
use crate::transport::{Fetcher, ResponseBody};

/// What the scripted fetcher does for one URL
#[derive(Clone)]
pub(crate) enum Script {
    /// Respond with these chunks and this declared length
    Body {
        declared: Option<u64>,
        chunks: Vec<Vec<u8>>,
    },
    /// Yield `chunks`, then fail the stream with a connection reset
    BreakAfter {
        declared: Option<u64>,
        chunks: Vec<Vec<u8>>,
    },
    /// Yield `head`, signal `reached`, wait for `resume`, then yield `tail`
    Paused {
        head: Vec<u8>,
        tail: Vec<u8>,
        reached: Arc<Notify>,
        resume: Arc<Notify>,
    },
    /// Final status >= 400 (post-retry)
    Status(u16),
    /// Panic inside the fetch
    Panic,
}

impl Script {
    /// A complete body of `len` bytes with a matching declared length
    pub(crate) fn ok(len: usize) -> Self {
        Script::Body {
            declared: Some(len as u64),
            chunks: vec![vec![0xAB; len]],
        }
    }
}

/// [`Fetcher`] that replays canned responses keyed by URL.
///
/// Unknown URLs answer `404`. Tracks call counts and the peak number of
/// concurrent `get` calls.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    /// Delay every `get` by `latency` (makes concurrency observable)
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn chunk_stream(
    chunks: Vec<Vec<u8>>,
) -> impl futures::Stream<Item = Result<Bytes, FetchError>> + Send + 'static {
    stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c))))
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, url: &str) -> Result<ResponseBody, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.scripts.get(url).cloned() {
            Some(Script::Body { declared, chunks }) => Ok(ResponseBody {
                content_length: declared,
                chunks: chunk_stream(chunks).boxed(),
            }),
            Some(Script::BreakAfter { declared, chunks }) => {
                let broken = stream::once(async {
                    Err(FetchError::Io(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "connection reset by peer",
                    )))
                });
                Ok(ResponseBody {
                    content_length: declared,
                    chunks: chunk_stream(chunks).chain(broken).boxed(),
                })
            }
            Some(Script::Paused {
                head,
                tail,
                reached,
                resume,
            }) => {
                let declared = (head.len() + tail.len()) as u64;
                let rest = stream::once(async move {
                    reached.notify_one();
                    resume.notified().await;
                    Ok(Bytes::from(tail))
                });
                Ok(ResponseBody {
                    content_length: Some(declared),
                    chunks: chunk_stream(vec![head]).chain(rest).boxed(),
                })
            }
            Some(Script::Status(code)) => Err(FetchError::Status(code)),
            Some(Script::Panic) => panic!("scripted fetcher panic for {url}"),
            None => Err(FetchError::Status(404)),
        }
    }
}

/// Config pointing at `dir` with `workers` concurrent downloads
pub(crate) fn test_config(dir: &std::path::Path, workers: usize) -> Config {
    let mut config = Config::default();
    config.download.output_dir = dir.to_path_buf();
    config.download.max_concurrent_downloads = workers;
    config.download.chunk_size = 4096;
    config
}

/// Engine over a scripted fetcher writing into a fresh temp dir.
/// Returns the engine, the fetcher (for call assertions) and the tempdir (keep it alive).
pub(crate) async fn create_test_downloader(
    fetcher: ScriptedFetcher,
    workers: usize,
) -> (BulkDownloader, Arc<ScriptedFetcher>, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(fetcher);
    let config = test_config(temp_dir.path(), workers);
    let downloader = BulkDownloader::with_fetcher(config, fetcher.clone())
        .await
        .unwrap();
    (downloader, fetcher, temp_dir)
}

/// Names of every entry in `dir`, sorted
pub(crate) fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
