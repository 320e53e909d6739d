//! Plain-text article records: writing one, reading the whole dataset back.
//!
//! # File Layout
//!
//! ```text
//! base_dir/
//! └── <category>/
//!     └── <source>/
//!         └── <id>_<slug(title)>.txt
//! ```
//!
//! # Record Format
//!
//! ```text
//! ID: 3f1c9a0b2d
//! TITULO: El Real Madrid gana la Champions
//! FECHA: 01/06/2024 22:59
//! PERIODICO: okdiario
//! CATEGORIA: deportes
//! URL: https://okdiario.com/deportes/articulo-x
//!
//! TEXTO:
//! Body text on a single whitespace-normalized line.
//! ```

use crate::dedup::partition_dir;
use crate::models::{ArticleRecord, Category, Source};
use crate::utils::slugify_filename;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

const ID_KEY: &str = "ID:";
const TITLE_KEY: &str = "TITULO:";
const DATE_KEY: &str = "FECHA:";
const SOURCE_KEY: &str = "PERIODICO:";
const CATEGORY_KEY: &str = "CATEGORIA:";
const URL_KEY: &str = "URL:";
const BODY_MARKER: &str = "TEXTO:";

/// Writes article records under a dataset root.
#[derive(Debug, Clone)]
pub struct ArticleRepository {
    base_dir: PathBuf,
}

impl ArticleRepository {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Persist `record`, creating its partition directory if needed.
    ///
    /// Returns the path written.
    #[instrument(level = "debug", skip_all, fields(id = %record.id))]
    pub async fn save(&self, record: &ArticleRecord) -> io::Result<PathBuf> {
        let dir = partition_dir(&self.base_dir, record.category, record.source);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(file_name(record));
        fs::write(&path, render(record)).await?;
        debug!(path = %path.display(), "Wrote record");
        Ok(path)
    }
}

/// `<id>_<slug(title)>.txt`
pub fn file_name(record: &ArticleRecord) -> String {
    format!("{}_{}.txt", record.id, slugify_filename(&record.title))
}

/// Serialize a record in the on-disk format.
pub fn render(record: &ArticleRecord) -> String {
    let lines = [
        format!("{ID_KEY} {}", record.id),
        format!("{TITLE_KEY} {}", record.title),
        format!("{DATE_KEY} {}", record.date),
        format!("{SOURCE_KEY} {}", record.source),
        format!("{CATEGORY_KEY} {}", record.category),
        format!("{URL_KEY} {}", record.url),
        String::new(),
        BODY_MARKER.to_string(),
        record.body.clone(),
    ];
    format!("{}\n", lines.join("\n").trim())
}

/// Parse one record file. `None` if any header is missing or unknown.
///
/// Header lines are recognised by their key prefix until the `TEXTO:` line;
/// everything after it is body, with lines joined by single spaces.
pub fn parse(text: &str) -> Option<ArticleRecord> {
    let mut id = None;
    let mut title = None;
    let mut date = None;
    let mut source = None;
    let mut category = None;
    let mut url = None;
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_body = false;

    for line in text.lines() {
        if in_body {
            body_lines.push(line);
            continue;
        }
        let value = |key: &str| line.strip_prefix(key).map(|v| v.trim().to_string());
        if let Some(v) = value(ID_KEY) {
            id = Some(v);
        } else if let Some(v) = value(TITLE_KEY) {
            title = Some(v);
        } else if let Some(v) = value(DATE_KEY) {
            date = Some(v);
        } else if let Some(v) = value(SOURCE_KEY) {
            source = Some(v.parse::<Source>().ok()?);
        } else if let Some(v) = value(CATEGORY_KEY) {
            category = Some(v.parse::<Category>().ok()?);
        } else if let Some(v) = value(URL_KEY) {
            url = Some(v);
        } else if line.starts_with(BODY_MARKER) {
            in_body = true;
        }
    }

    Some(ArticleRecord {
        id: id?,
        title: title?,
        date: date?,
        source: source?,
        category: category?,
        url: url?,
        body: body_lines.join(" ").trim().to_string(),
    })
}

/// Load every well-formed record under `base_dir`.
///
/// Walks `<category>/<source>/*.txt` in sorted order. Malformed or
/// unreadable files are skipped with a warning; a missing `base_dir` is an
/// empty corpus.
#[instrument(level = "info", skip_all, fields(base_dir = %base_dir.display()))]
pub async fn load_all(base_dir: &Path) -> io::Result<Vec<ArticleRecord>> {
    let mut records = Vec::new();
    if !fs::try_exists(base_dir).await? {
        warn!("Dataset directory does not exist");
        return Ok(records);
    }

    for category_dir in sorted_dirs(base_dir).await? {
        for source_dir in sorted_dirs(&category_dir).await? {
            for path in sorted_files(&source_dir, "txt").await? {
                let text = match fs::read_to_string(&path).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Unreadable record");
                        continue;
                    }
                };
                match parse(&text) {
                    Some(record) => records.push(record),
                    None => warn!(path = %path.display(), "Malformed record skipped"),
                }
            }
        }
    }

    info!(count = records.len(), "Loaded records");
    Ok(records)
}

async fn sorted_dirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}

async fn sorted_files(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file()
            && path.extension().is_some_and(|ext| ext == extension)
        {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}
