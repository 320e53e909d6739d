//! Telemadrid article extraction.
//!
//! Telemadrid's templates vary more than the other outlets'. Three attempts
//! are made in order:
//!
//! 1. Paragraphs inside `[itemprop="articleBody"]`
//! 2. Paragraphs inside `<main>`
//! 3. All visible page text, capped at [`FALLBACK_MAX_CHARS`]
//!
//! The first two only count if they yield at least
//! [`STRUCTURED_MIN_CHARS`] characters.

use super::{ExtractError, headline, paragraphs, publication_date};
use crate::models::ArticleContent;
use crate::utils::{collapse_whitespace, truncate_chars};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static ARTICLE_BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[itemprop="articleBody"]"#).expect("valid selector"));
static MAIN: Lazy<Selector> = Lazy::new(|| Selector::parse("main").expect("valid selector"));

/// Minimum body a structured container must yield to be trusted.
pub const STRUCTURED_MIN_CHARS: usize = 200;

/// Cap on the whole-page fallback text.
pub const FALLBACK_MAX_CHARS: usize = 4000;

pub fn parse_article(document: &Html) -> Result<ArticleContent, ExtractError> {
    let title = headline(document);
    let date = publication_date(document);

    for selector in [&*ARTICLE_BODY, &*MAIN] {
        if let Some(container) = document.select(selector).next() {
            let body = paragraphs(container);
            if body.chars().count() >= STRUCTURED_MIN_CHARS {
                return Ok(ArticleContent { title, date, body });
            }
        }
    }

    let text = visible_text(document);
    let body = truncate_chars(&text, FALLBACK_MAX_CHARS).to_string();
    Ok(ArticleContent { title, date, body })
}

/// Every text node outside `<script>`, `<style>`, `<noscript>` and
/// `<template>`, one per line.
fn visible_text(document: &Html) -> String {
    let mut lines = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor.value().as_element().is_some_and(|el| {
                matches!(el.name(), "script" | "style" | "noscript" | "template")
            })
        });
        if hidden {
            continue;
        }
        let line = collapse_whitespace(text);
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}
