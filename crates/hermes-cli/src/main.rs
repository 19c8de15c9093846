use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hermes_client::ReqwestFetcher;
use hermes_core::dispatcher::{DEFAULT_WORKERS, Dispatcher, DispatcherConfig};

#[derive(Parser)]
#[command(name = "hermes", version, about = "Concurrent URL fetch dispatcher")]
struct Cli {
    /// URLs to fetch (duplicates are fetched independently)
    #[arg(required = true)]
    urls: Vec<String>,

    /// Worker pool size
    #[arg(short, long, env = "HERMES_WORKERS", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Suppress the per-fetch log line
    #[arg(short, long, env = "HERMES_QUIET", default_value_t = false)]
    quiet: bool,

    /// Per-request timeout in seconds. No timeout when omitted: a hung
    /// request will stall the run.
    #[arg(long, env = "HERMES_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hermes=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let fetcher = match cli.timeout_secs {
        Some(secs) => ReqwestFetcher::with_timeout(Duration::from_secs(secs)),
        None => ReqwestFetcher::new(),
    }
    .map_err(|e| anyhow::anyhow!(e))
    .context("Failed to create HTTP client")?;

    let config = DispatcherConfig::default()
        .with_workers(cli.workers)
        .with_verbose(!cli.quiet);

    let dispatcher = Dispatcher::new(fetcher, config);
    let report = dispatcher.dispatch(cli.urls).await;

    let failed = report.results.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        tracing::warn!(%failed, "Some fetches did not return a 2xx response");
    }

    // Summary to stderr with the logs, results as JSON to stdout.
    eprintln!("{report}");
    println!("{}", serde_json::to_string_pretty(&report.results)?);

    Ok(())
}
