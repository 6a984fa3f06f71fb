//! HTTP transport: pooled reqwest client plus the retry policy.
//!
//! The download task issues one logical GET through [`Fetcher::get`] and gets
//! back either a body stream or a final error. Every retry happens in here,
//! before a response is handed over; once bytes start flowing nothing is
//! retried.

use std::time::Duration;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};

use crate::config::{HttpConfig, RetryConfig};
use crate::error::FetchError;
use crate::retry::download_with_retry;

/// A response whose status was acceptable, ready to be streamed
pub struct ResponseBody {
    /// Declared `Content-Length`, if the server sent one
    pub content_length: Option<u64>,
    /// Body chunks as they arrive
    pub chunks: BoxStream<'static, Result<Bytes, FetchError>>,
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Abstraction over HTTP GET, enabling testability.
///
/// Implementations own their retry behaviour; a returned error is final.
/// Statuses >= 400 must surface as [`FetchError::Status`].
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue a GET for `url`
    async fn get(&self, url: &str) -> Result<ResponseBody, FetchError>;
}

/// Production [`Fetcher`] backed by a pooled reqwest client.
///
/// Cheap to share: the client is internally reference counted and the retry
/// policy is immutable.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    retry: RetryConfig,
    read_timeout: Duration,
}

impl HttpTransport {
    /// Build a transport with `pool_size` idle connections kept per host
    pub fn new(
        http: &HttpConfig,
        retry: RetryConfig,
        pool_size: usize,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(http.connect_timeout)
            .pool_max_idle_per_host(pool_size.max(1))
            .user_agent(http.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            retry,
            read_timeout: http.read_timeout,
        })
    }

    /// Retry policy this transport was built with
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Single request attempt: send, wait for the head, classify the status.
    async fn attempt(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let send = self.client.get(url).send();
        let response = tokio::time::timeout(self.read_timeout, send)
            .await
            .map_err(|_| FetchError::Timeout(self.read_timeout))?
            .map_err(FetchError::Connection)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("retry", &self.retry)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpTransport {
    async fn get(&self, url: &str) -> Result<ResponseBody, FetchError> {
        let response = download_with_retry(&self.retry, || self.attempt(url)).await?;

        let content_length = response.content_length();
        let read_timeout = self.read_timeout;
        let chunks = tokio_stream::StreamExt::timeout(response.bytes_stream(), read_timeout)
            .map(move |item| match item {
                Ok(Ok(bytes)) => Ok(bytes),
                Ok(Err(e)) => Err(FetchError::Connection(e)),
                Err(_elapsed) => Err(FetchError::Timeout(read_timeout)),
            })
            .boxed();

        Ok(ResponseBody {
            content_length,
            chunks,
        })
    }
}
