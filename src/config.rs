//! Configuration types for bulk-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Download behavior configuration (output location, concurrency, buffering)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Output directory (default: "./downloads")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Extension given to every downloaded file (default: "mp4")
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Maximum concurrent downloads (default: 6, 0 is treated as 1)
    ///
    /// Also sizes the per-host idle connection pool.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Write buffer size in bytes (default: 1 MiB)
    ///
    /// Response chunks are accumulated up to this size before hitting the disk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_extension: default_file_extension(),
            max_concurrent_downloads: default_max_concurrent(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// HTTP client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout for establishing a TCP/TLS connection (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Maximum wait for the response head or any single body chunk (default: 60 seconds)
    ///
    /// This is a per-read bound, not a whole-transfer deadline: a large file
    /// that keeps making progress is never cut off.
    #[serde(default = "default_read_timeout", with = "duration_serde")]
    pub read_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first request (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 8 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,

    /// HTTP statuses treated as transient (default: 429, 500, 502, 503, 504)
    ///
    /// Any other 4xx/5xx status is returned to the caller immediately.
    #[serde(default = "default_retry_on_status")]
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
            retry_on_status: default_retry_on_status(),
        }
    }
}

impl RetryConfig {
    /// Whether a response with this status should be retried
    pub fn retries_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }
}

/// Main configuration for [`BulkDownloader`](crate::BulkDownloader)
///
/// Every field has a default, so an empty JSON object is a valid config file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Output location, concurrency and buffering
    #[serde(default)]
    pub download: DownloadConfig,

    /// HTTP client timeouts and identification
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry policy applied below each download
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Load a configuration from a JSON file, filling unset fields with defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_json::from_slice(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a working run
    pub fn validate(&self) -> Result<()> {
        if self.download.chunk_size == 0 {
            return Err(Error::Config {
                message: "chunk_size must be at least 1 byte".to_string(),
                key: Some("chunk_size".to_string()),
            });
        }
        if self.download.file_extension.is_empty()
            || self.download.file_extension.contains(['/', '\\'])
        {
            return Err(Error::Config {
                message: format!(
                    "file_extension '{}' is not a valid extension",
                    self.download.file_extension
                ),
                key: Some("file_extension".to_string()),
            });
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(Error::Config {
                message: "backoff_multiplier must be >= 1.0".to_string(),
                key: Some("backoff_multiplier".to_string()),
            });
        }
        Ok(())
    }

    /// Output directory
    pub fn output_dir(&self) -> &PathBuf {
        &self.download.output_dir
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_file_extension() -> String {
    "mp4".to_string()
}

fn default_max_concurrent() -> usize {
    6
}

fn default_chunk_size() -> usize {
    1024 * 1024
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_user_agent() -> String {
    format!("bulk-dl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(8)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_retry_on_status() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
