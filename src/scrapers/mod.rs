//! Per-source article extraction.
//!
//! Each outlet marks up its articles differently, so each gets its own
//! submodule that turns an article page into an [`ArticleContent`]. The set
//! of sources is fixed, so dispatch is a closed enum, [`Extractor`], chosen
//! from the source table in [`crate::sources`].
//!
//! # Supported Sources
//!
//! | Source | Module | Body container | Notes |
//! |--------|--------|----------------|-------|
//! | Telemadrid | [`telemadrid`] | `[itemprop=articleBody]`, then `<main>` | Falls back to capped page text |
//! | El Mundo | [`elmundo`] | `<article>` | Fails without an `<article>` |
//! | OkDiario | [`okdiario`] | `<article>` | Falls back to the whole document |
//!
//! # Common Policy
//!
//! - Title is the first `<h1>`, or [`NO_TITLE`]
//! - Date is the first `<time>` text as published, or [`NO_DATE`]
//! - Body is the non-empty `<p>` texts of the container joined by newlines

pub mod elmundo;
pub mod okdiario;
pub mod telemadrid;

use crate::fetch::{FetchError, PageFetcher};
use crate::models::{ArticleContent, NO_DATE, NO_TITLE};
use crate::utils::{collapse_whitespace, truncate_for_log};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, instrument};

static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").expect("valid selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid selector"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").expect("valid selector"));

/// Why an article page produced no content.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no {0} container on the page")]
    MissingContainer(&'static str),
}

/// Extraction strategy for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Telemadrid,
    ElMundo,
    OkDiario,
}

impl Extractor {
    /// Parse an already fetched article page.
    pub fn extract_html(self, html: &str) -> Result<ArticleContent, ExtractError> {
        let document = Html::parse_document(html);
        match self {
            Extractor::Telemadrid => telemadrid::parse_article(&document),
            Extractor::ElMundo => elmundo::parse_article(&document),
            Extractor::OkDiario => okdiario::parse_article(&document),
        }
    }

    /// Fetch `url` and extract its content.
    #[instrument(level = "debug", skip(self, fetcher), fields(extractor = ?self))]
    pub async fn extract<F: PageFetcher>(
        self,
        fetcher: &F,
        url: &str,
    ) -> Result<ArticleContent, ExtractError> {
        let html = fetcher.fetch(url).await?;
        let content = self.extract_html(&html)?;
        debug!(
            title = %truncate_for_log(&content.title, 80),
            body_chars = content.body.chars().count(),
            "Extracted article"
        );
        Ok(content)
    }
}

/// Text of an element with whitespace collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// First `<h1>` text, or [`NO_TITLE`].
pub(crate) fn headline(document: &Html) -> String {
    document
        .select(&HEADLINE)
        .map(element_text)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

/// First `<time>` text, or [`NO_DATE`]. The source's own format is kept.
pub(crate) fn publication_date(document: &Html) -> String {
    document
        .select(&TIME)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_DATE.to_string())
}

/// Non-empty paragraph texts under `scope`, one per line.
pub(crate) fn paragraphs(scope: ElementRef<'_>) -> String {
    scope
        .select(&PARAGRAPH)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First `<article>` element, if any.
pub(crate) fn article_element(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&ARTICLE).next()
}
