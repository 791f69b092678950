use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use strava_client::Config;
use strava_client::http_client::ReqwestStravaClient;
use strava_export::{DEFAULT_MARKER, DEFAULT_OUTPUT, ExportOptions};

/// Export Strava activities whose name contains a keyword to a CSV file.
#[derive(Debug, Parser)]
#[command(name = "strava-export", version, about)]
struct Cli {
    /// Destination file, replaced on every run.
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Case-insensitive substring an activity name must contain.
    #[arg(long, default_value = DEFAULT_MARKER)]
    marker: String,

    /// Activities requested per page (1-100).
    #[arg(
        long,
        default_value_t = strava_client::MAX_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(strava_client::MAX_PAGE_SIZE))
    )]
    per_page: u32,

    /// Fetch every page instead of stopping when one page is not enough.
    #[arg(long)]
    all_pages: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let dotenv = match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => return Err(e).context("reading .env"),
    };

    // Configure logging from env var `STRAVA_EXPORT_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("STRAVA_EXPORT_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    if let Some(path) = dotenv {
        tracing::debug!("loaded environment from {}", path.display());
    }

    let config = Config::from_env().context("loading Strava credentials")?;
    let client = ReqwestStravaClient::new(config).context("building HTTP client")?;

    let opts = ExportOptions {
        output: cli.output,
        marker: cli.marker,
        per_page: cli.per_page,
        all_pages: cli.all_pages,
    };
    let summary = strava_export::run(&client, &opts)
        .await
        .with_context(|| format!("exporting to {}", opts.output.display()))?;
    tracing::info!(
        fetched = summary.fetched,
        matched = summary.matched,
        "strava-export finished"
    );

    Ok(())
}
