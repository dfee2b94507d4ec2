//! # Diário Crawlers
//!
//! Crawlers for the official gazettes ("diários oficiais") of two Brazilian
//! municipalities. Each spider queries its city portal, maps every
//! publication to a normalized [`models::Gazette`] record, and hands the
//! records to a JSON sink for the downstream download pipeline.
//!
//! ## Spiders
//!
//! - `pa_belem`: Belém (PA), JSON search API
//! - `ro_porto_velho`: Porto Velho (RO), monthly listings with HTML fragments
//!
//! ## Usage
//!
//! ```sh
//! diario_crawlers -s pa_belem --start-date 2023-01-01 -o ./data
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: CLI flags plus an optional YAML file
//! 2. **Crawling**: each selected spider runs against a retrying HTTP fetcher
//! 3. **Output**: JSON files per spider, or JSON lines on stdout

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod outputs;
mod spiders;
mod utils;

use cli::Cli;
use config::load_config;
use fetch::build_fetcher;
use outputs::json;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("diario_crawlers starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = load_config(args.config.as_deref()).await?;
    let fetcher = build_fetcher(&config)?;

    if let Some(dir) = args.output_dir.as_deref() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let today = Local::now().date_naive();
    let mut total = 0usize;
    let mut failed = Vec::new();

    for spider in args.selected_spiders() {
        let name = spider.as_str();
        info!(spider = name, "Running spider");

        let gazettes =
            match spiders::crawl(spider, &fetcher, args.start_date, args.end_date, today).await {
                Ok(gazettes) => gazettes,
                Err(e) => {
                    error!(spider = name, error = %e, "Spider failed; continuing with the next one");
                    failed.push(name);
                    continue;
                }
            };
        total += gazettes.len();

        match args.output_dir.as_deref() {
            Some(dir) => {
                json::write_gazettes(name, &gazettes, dir, today).await?;
            }
            None => json::print_json_lines(&gazettes)?,
        }
        info!(spider = name, count = gazettes.len(), "Spider finished");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        gazettes = total,
        failed_spiders = ?failed,
        "Execution complete"
    );

    if !failed.is_empty() {
        return Err(format!("spiders failed: {}", failed.join(", ")).into());
    }
    Ok(())
}
