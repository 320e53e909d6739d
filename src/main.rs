//! # Noticias Crawler
//!
//! Harvests news articles from the section pages of several Spanish outlets,
//! checks that each article really belongs to the section it was listed
//! under, skips anything already stored, and saves the rest as plain-text
//! records for a downstream recommendation stage.
//!
//! ## Usage
//!
//! ```sh
//! noticias_crawler crawl --base-dir ./dataset --quota 100
//! noticias_crawler corpus --base-dir ./dataset --json
//! ```
//!
//! ## Architecture
//!
//! Each (source, category) job runs as a pipeline:
//! 1. **Links**: Collect same-site links from the section listing page
//! 2. **Classification**: URL path rule, then page signals where needed
//! 3. **Deduplication**: Skip URLs whose record already exists
//! 4. **Extraction**: Per-source title, date and body parsing
//! 5. **Output**: Write one text record per article

use clap::Parser;
use itertools::Itertools;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod classify;
mod cli;
mod config;
mod crawler;
mod dedup;
mod fetch;
mod links;
mod models;
mod outputs;
mod scrapers;
mod sources;
mod utils;

use cli::{Cli, Command, CorpusArgs, CrawlArgs};
use config::CrawlConfig;
use crawler::{Crawler, jobs};
use fetch::{HttpFetcher, RetryFetch};
use outputs::{json, record};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let cli = Cli::parse();
    debug!(?cli, "Parsed CLI arguments");

    match cli.command {
        Command::Crawl(args) => crawl(args).await,
        Command::Corpus(args) => corpus(args).await,
    }
}

#[instrument(level = "info", skip_all)]
async fn crawl(args: CrawlArgs) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();

    let config = match &args.config {
        Some(path) => CrawlConfig::load(path).await?,
        None => CrawlConfig::default(),
    };
    let config = args.apply(config);

    if let Err(e) = ensure_writable_dir(&config.base_dir).await {
        error!(
            path = %config.base_dir.display(),
            error = %e,
            "Dataset directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let fetcher = RetryFetch::from_config(HttpFetcher::new(&config.fetch)?, &config.fetch);
    let job_list = jobs(&args.selected_sources(), &args.selected_categories());
    let crawler = Crawler::new(fetcher, config);

    let summaries = crawler.run_all(job_list).await;

    if let Some(path) = &args.summary_json {
        if let Err(e) = json::write_summaries(&summaries, path).await {
            error!(path = %path.display(), error = %e, "Failed to write crawl summary");
        }
    }

    let saved: usize = summaries.iter().map(|s| s.saved).sum();
    let duplicates: usize = summaries.iter().map(|s| s.skipped_duplicate).sum();
    let elapsed = start_time.elapsed();
    info!(
        jobs = summaries.len(),
        saved,
        duplicates,
        ?elapsed,
        "Crawl complete"
    );
    Ok(())
}

#[instrument(level = "info", skip_all, fields(base_dir = %args.base_dir.display()))]
async fn corpus(args: CorpusArgs) -> Result<(), Box<dyn Error>> {
    let records = record::load_all(&args.base_dir).await?;

    let counts = records
        .iter()
        .counts_by(|r| (r.category, r.source))
        .into_iter()
        .sorted();
    for ((category, source), count) in counts {
        info!(%category, %source, count, "Partition");
    }
    info!(total = records.len(), "Corpus loaded");

    if args.json {
        print!("{}", json::corpus_json_lines(&records)?);
    }
    Ok(())
}
