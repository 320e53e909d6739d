//! JSON output for crawl summaries and the loaded corpus.
//!
//! - [`write_summaries`]: one JSON array with every job's [`CrawlSummary`]
//! - [`corpus_json_lines`]: one JSON object per record, for the
//!   recommendation stage to ingest

use crate::crawler::CrawlSummary;
use crate::models::ArticleRecord;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write all job summaries to `path` as pretty-printed JSON.
///
/// Parent directories are created as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_summaries(
    summaries: &[CrawlSummary],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(summaries)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create summary dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(jobs = summaries.len(), "Wrote crawl summary");
    Ok(())
}

/// Serialize records as JSON lines.
pub fn corpus_json_lines(records: &[ArticleRecord]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}
