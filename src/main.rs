use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bulk_dl::{BulkDownloader, Config, Error, Reporter};

/// Download every source URL of a work list into one directory
#[derive(Parser)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// JSON file holding an array of `[reference_url, source_url]` pairs
    list: PathBuf,

    /// Directory files are written to
    #[clap(short, long, env = "BULK_DL_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Number of concurrent downloads
    #[clap(short, long, env = "BULK_DL_WORKERS")]
    workers: Option<usize>,

    /// JSON config file; command line flags override its values
    #[clap(short, long, env = "BULK_DL_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(output_dir) = args.output_dir {
        config.download.output_dir = output_dir;
    }
    if let Some(workers) = args.workers {
        config.download.max_concurrent_downloads = workers;
    }

    let pairs = load_work_list(&args.list)?;
    let downloader = BulkDownloader::new(config).await?;
    let reporter = Reporter::stdout();

    let tasks = downloader.prepare(pairs.iter().cloned());
    reporter.line(&format!(
        "Starting concurrent downloads to {} with {} workers...",
        downloader.config().output_dir().display(),
        downloader.config().download.max_concurrent_downloads.max(1)
    ));
    reporter.line(&format!(
        "Input: {} | After de-dup: {}",
        pairs.len(),
        tasks.len()
    ));

    // Individual download failures are reported, not turned into an exit code
    reporter.consume(downloader.run_tasks(tasks)).await;
    Ok(())
}

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // stdout carries the report, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_work_list(path: &Path) -> Result<Vec<(String, String)>, Error> {
    let content = std::fs::read(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read work list '{}': {}", path.display(), e),
        ))
    })?;
    Ok(serde_json::from_slice(&content)?)
}
