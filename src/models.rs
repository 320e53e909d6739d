//! Data models for sources, categories, and stored articles.
//!
//! This module defines the core data structures used throughout the crawler:
//! - [`Source`]: A registered news outlet
//! - [`Category`]: A topical section a listing page groups articles under
//! - [`ArticleContent`]: What an extractor pulls out of an article page
//! - [`ArticleRecord`]: The validated unit persisted to disk
//!
//! Sources and categories serialize as their lowercase ids (`"okdiario"`,
//! `"deportes"`), which is also how they appear in record files and in the
//! dataset directory layout.

use crate::utils::collapse_whitespace;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Title written when an article page has no usable heading.
pub const NO_TITLE: &str = "Sin título";

/// Date written when an article page has no `<time>` element.
pub const NO_DATE: &str = "Sin fecha";

/// Number of hex characters kept from the URL digest.
pub const ID_LEN: usize = 10;

/// A registered news outlet.
///
/// The per-source URL conventions and extractor live in
/// [`crate::sources::SourceProfile`]; this enum is only the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Telemadrid,
    ElMundo,
    OkDiario,
}

impl Source {
    /// Every registered source, in crawl order.
    pub const ALL: [Source; 3] = [Source::Telemadrid, Source::OkDiario, Source::ElMundo];

    /// The id used in record headers and directory names.
    pub fn id(self) -> &'static str {
        match self {
            Source::Telemadrid => "telemadrid",
            Source::ElMundo => "elmundo",
            Source::OkDiario => "okdiario",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Source {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = crate::utils::normalize_label(s);
        Source::ALL
            .into_iter()
            .find(|source| source.id() == wanted)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// A topical section.
///
/// Sources do not label sections consistently, so each category carries a
/// small set of accepted synonyms next to its canonical id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Deportes,
    Economia,
    Internacional,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Deportes,
        Category::Economia,
        Category::Internacional,
    ];

    /// Canonical, already normalized id. Also the path segment sources use.
    pub fn id(self) -> &'static str {
        match self {
            Category::Deportes => "deportes",
            Category::Economia => "economia",
            Category::Internacional => "internacional",
        }
    }

    /// The canonical id followed by every accepted synonym, all normalized.
    pub fn equivalents(self) -> &'static [&'static str] {
        match self {
            Category::Deportes => &["deportes"],
            Category::Economia => &["economia", "economia y negocios", "negocios"],
            Category::Internacional => &["internacional", "mundo"],
        }
    }

    /// True if `label` names this category once normalized.
    pub fn is_equivalent(self, label: &str) -> bool {
        let label = crate::utils::normalize_label(label);
        self.equivalents().iter().any(|e| *e == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = crate::utils::normalize_label(s);
        Category::ALL
            .into_iter()
            .find(|category| category.id() == wanted)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// A source or category label that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown label: {0:?}")]
pub struct UnknownLabel(pub String);

/// Title, date and body text pulled from one article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContent {
    pub title: String,
    pub date: String,
    pub body: String,
}

/// A validated article, ready to persist or loaded back from disk.
///
/// The `id` is a pure function of `url` (see [`article_id`]), which is what
/// deduplication relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: String,
    pub title: String,
    pub date: String,
    pub source: Source,
    pub category: Category,
    pub url: String,
    pub body: String,
}

impl ArticleRecord {
    /// Build a record from freshly extracted content.
    ///
    /// Title, date and body are whitespace-normalized here so the record
    /// compares equal to what [`crate::outputs::record::load_all`] reads back.
    pub fn new(source: Source, category: Category, url: &str, content: ArticleContent) -> Self {
        let title = collapse_whitespace(&content.title);
        let date = collapse_whitespace(&content.date);
        Self {
            id: article_id(url),
            title: if title.is_empty() { NO_TITLE.to_string() } else { title },
            date: if date.is_empty() { NO_DATE.to_string() } else { date },
            source,
            category,
            url: url.to_string(),
            body: collapse_whitespace(&content.body),
        }
    }

    /// Length of the body in characters, the unit the minimum-length policy uses.
    pub fn body_chars(&self) -> usize {
        self.body.chars().count()
    }
}

/// Stable short identifier for an article URL.
///
/// The first [`ID_LEN`] hex characters of the SHA-256 digest of the URL.
pub fn article_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(ID_LEN);
    id
}
