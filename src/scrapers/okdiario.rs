//! OkDiario article extraction.
//!
//! Article bodies sit in an `<article>` element. Some templates omit it, in
//! which case every paragraph on the page is taken and the orchestrator's
//! minimum-length check decides whether the result is usable.

use super::{ExtractError, article_element, headline, paragraphs, publication_date};
use crate::models::ArticleContent;
use scraper::Html;

/// Extract title, date and body from an OkDiario article page.
pub fn parse_article(document: &Html) -> Result<ArticleContent, ExtractError> {
    let scope = article_element(document).unwrap_or_else(|| document.root_element());
    Ok(ArticleContent {
        title: headline(document),
        date: publication_date(document),
        body: paragraphs(scope),
    })
}
