//! Crawl orchestration for (source, category) jobs.
//!
//! One job walks a single listing page:
//!
//! ```text
//! collect links
//!   └─ for each link (until the quota is met)
//!        fast filter → [verify page] → dedup check → extract → length check → save
//! ```
//!
//! Every per-link failure is a [`SkipReason`] counted in the job's
//! [`CrawlSummary`]; none of them stops the job. Only successful saves are
//! followed by the randomized courtesy pause.
//!
//! Jobs are sequential inside; [`Crawler::run_all`] may overlap several jobs,
//! which is safe because each writes to its own dataset partition.

use crate::classify;
use crate::config::CrawlConfig;
use crate::dedup;
use crate::fetch::PageFetcher;
use crate::links;
use crate::models::{ArticleRecord, Category, Source};
use crate::outputs::record::ArticleRepository;
use crate::scrapers::ExtractError;
use chrono::Local;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use rand::{Rng, rng};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Why a candidate link was not saved.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("not in the requested category")]
    CategoryMismatch,
    #[error("already persisted")]
    AlreadyPersisted,
    #[error(transparent)]
    Extraction(#[from] ExtractError),
    #[error("body too short: {0} chars")]
    TooShort(usize),
    #[error("could not write record: {0}")]
    Persist(#[from] io::Error),
}

/// Counters for one finished job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub source: Source,
    pub category: Category,
    pub listing_url: String,
    pub started_at: String,
    pub links_found: usize,
    pub reviewed: usize,
    pub saved: usize,
    pub skipped_duplicate: usize,
    pub rejected_category: usize,
    pub fetch_failed: usize,
    pub extraction_failed: usize,
    pub too_short: usize,
    pub persist_failed: usize,
    pub elapsed_ms: u64,
}

impl CrawlSummary {
    pub fn new(source: Source, category: Category, listing_url: &str) -> Self {
        Self {
            source,
            category,
            listing_url: listing_url.to_string(),
            started_at: Local::now().to_rfc3339(),
            links_found: 0,
            reviewed: 0,
            saved: 0,
            skipped_duplicate: 0,
            rejected_category: 0,
            fetch_failed: 0,
            extraction_failed: 0,
            too_short: 0,
            persist_failed: 0,
            elapsed_ms: 0,
        }
    }

    fn record_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::CategoryMismatch => self.rejected_category += 1,
            SkipReason::AlreadyPersisted => self.skipped_duplicate += 1,
            SkipReason::Extraction(ExtractError::Fetch(_)) => self.fetch_failed += 1,
            SkipReason::Extraction(ExtractError::MissingContainer(_)) => {
                self.extraction_failed += 1
            }
            SkipReason::TooShort(_) => self.too_short += 1,
            SkipReason::Persist(_) => self.persist_failed += 1,
        }
    }

    pub fn write_to_log(&self) {
        info!(
            source = %self.source,
            category = %self.category,
            links_found = self.links_found,
            reviewed = self.reviewed,
            saved = self.saved,
            skipped_duplicate = self.skipped_duplicate,
            rejected_category = self.rejected_category,
            fetch_failed = self.fetch_failed,
            extraction_failed = self.extraction_failed,
            too_short = self.too_short,
            persist_failed = self.persist_failed,
            elapsed_ms = self.elapsed_ms,
            "Job finished"
        );
    }
}

/// Every (source, category) pair, categories outermost.
pub fn jobs(sources: &[Source], categories: &[Category]) -> Vec<(Source, Category)> {
    categories
        .iter()
        .cartesian_product(sources.iter())
        .map(|(category, source)| (*source, *category))
        .filter(|(source, category)| source.profile().categories().any(|c| c == *category))
        .unique()
        .collect()
}

/// Runs crawl jobs against a fetcher and a dataset directory.
pub struct Crawler<F> {
    fetcher: F,
    repository: ArticleRepository,
    config: CrawlConfig,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(fetcher: F, config: CrawlConfig) -> Self {
        let repository = ArticleRepository::new(config.base_dir.clone());
        Self {
            fetcher,
            repository,
            config,
        }
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run `jobs` with at most `parallel_jobs` in flight. Summaries come
    /// back in job order.
    pub async fn run_all(&self, jobs: Vec<(Source, Category)>) -> Vec<CrawlSummary> {
        let parallel = self.config.parallel_jobs.max(1);
        info!(jobs = jobs.len(), parallel, "Starting crawl");
        stream::iter(jobs)
            .map(|(source, category)| self.run_job(source, category))
            .buffered(parallel)
            .collect()
            .await
    }

    /// Crawl one source's listing page for one category.
    #[instrument(level = "info", skip(self))]
    pub async fn run_job(&self, source: Source, category: Category) -> CrawlSummary {
        let t0 = Instant::now();
        let listing_url = source.profile().listing_url(category);
        let mut summary = CrawlSummary::new(source, category, listing_url);

        let candidates = links::collect(&self.fetcher, source, listing_url).await;
        summary.links_found = candidates.len();
        if candidates.is_empty() {
            warn!(listing_url, "No links found on listing page");
        }

        for url in &candidates {
            if summary.saved >= self.config.quota {
                info!(quota = self.config.quota, "Quota reached");
                break;
            }
            summary.reviewed += 1;

            match self.process_link(source, category, url).await {
                Ok(path) => {
                    summary.saved += 1;
                    info!(saved = summary.saved, %url, path = %path.display(), "Saved article");
                    self.pause().await;
                }
                Err(reason) => {
                    match &reason {
                        SkipReason::Persist(e) => warn!(%url, error = %e, "Failed to save article"),
                        other => debug!(%url, reason = %other, "Skipping link"),
                    }
                    summary.record_skip(&reason);
                }
            }
        }

        summary.elapsed_ms = u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX);
        summary.write_to_log();
        summary
    }

    async fn process_link(
        &self,
        source: Source,
        category: Category,
        url: &str,
    ) -> Result<PathBuf, SkipReason> {
        if !classify::matches(&self.fetcher, source, category, url).await {
            return Err(SkipReason::CategoryMismatch);
        }

        if dedup::already_persisted(self.repository.base_dir(), category, source, url).await {
            return Err(SkipReason::AlreadyPersisted);
        }

        let content = source.profile().extractor.extract(&self.fetcher, url).await?;
        let record = ArticleRecord::new(source, category, url, content);

        let chars = record.body_chars();
        if chars < self.config.min_body_chars {
            return Err(SkipReason::TooShort(chars));
        }

        Ok(self.repository.save(&record).await?)
    }

    /// Sleep a uniform random time within the configured pause range.
    async fn pause(&self) {
        let (min, max) = self.config.pause_range();
        if max.is_zero() {
            return;
        }
        let secs = rng().random_range(min.as_secs_f64()..=max.as_secs_f64());
        let delay = Duration::from_secs_f64(secs);
        debug!(?delay, "Pausing");
        sleep(delay).await;
    }
}
