//! El Mundo article extraction.
//!
//! El Mundo always wraps article text in `<article>`; a page without one is a
//! gallery, live blog or landing page and is rejected.

use super::{ExtractError, article_element, headline, paragraphs, publication_date};
use crate::models::ArticleContent;
use scraper::Html;

pub fn parse_article(document: &Html) -> Result<ArticleContent, ExtractError> {
    let article = article_element(document).ok_or(ExtractError::MissingContainer("article"))?;
    Ok(ArticleContent {
        title: headline(document),
        date: publication_date(document),
        body: paragraphs(article),
    })
}
