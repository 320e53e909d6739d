//! Command-line interface definitions.
//!
//! This module defines the CLI arguments using the `clap` crate. Options
//! given here override the YAML configuration file, which in turn overrides
//! the built-in defaults.

use crate::config::CrawlConfig;
use crate::models::{Category, Source};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the crawler.
///
/// # Examples
///
/// ```sh
/// # Crawl everything with defaults into ./dataset
/// noticias_crawler crawl
///
/// # One source, two sections, small quota, no pauses
/// noticias_crawler crawl -s okdiario --category deportes --category economia -q 5 --no-pause
///
/// # Export the stored corpus as JSON lines
/// noticias_crawler corpus --json > corpus.jsonl
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl section listings and store newly found articles
    Crawl(CrawlArgs),
    /// Load the stored dataset and report or export it
    Corpus(CorpusArgs),
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "NOTICIAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Dataset root directory
    #[arg(short, long, env = "NOTICIAS_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Maximum articles saved per source and category
    #[arg(short, long)]
    pub quota: Option<usize>,

    /// Source to crawl (repeatable; default: all)
    #[arg(short, long = "source")]
    pub sources: Vec<Source>,

    /// Category to crawl (repeatable; default: all)
    #[arg(long = "category")]
    pub categories: Vec<Category>,

    /// Jobs allowed to run at the same time
    #[arg(long)]
    pub parallel_jobs: Option<usize>,

    /// Skip the pause after each saved article
    #[arg(long)]
    pub no_pause: bool,

    /// Write per-job summaries to this JSON file
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

impl CrawlArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, mut config: CrawlConfig) -> CrawlConfig {
        if let Some(base_dir) = &self.base_dir {
            config.base_dir = base_dir.clone();
        }
        if let Some(quota) = self.quota {
            config.quota = quota;
        }
        if let Some(parallel_jobs) = self.parallel_jobs {
            config.parallel_jobs = parallel_jobs;
        }
        if self.no_pause {
            config = config.without_pause();
        }
        config
    }

    pub fn selected_sources(&self) -> Vec<Source> {
        if self.sources.is_empty() {
            Source::ALL.to_vec()
        } else {
            self.sources.clone()
        }
    }

    pub fn selected_categories(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            Category::ALL.to_vec()
        } else {
            self.categories.clone()
        }
    }
}

#[derive(Args, Debug)]
pub struct CorpusArgs {
    /// Dataset root directory
    #[arg(short, long, env = "NOTICIAS_BASE_DIR", default_value = "dataset")]
    pub base_dir: PathBuf,

    /// Print every record as a JSON line on stdout
    #[arg(long)]
    pub json: bool,
}
