//! The registered news outlets and their URL conventions.
//!
//! Everything source-specific that is not HTML extraction lives in one table,
//! [`PROFILES`], one row per [`Source`]:
//!
//! | Source | Base URL | Path rule | Verification |
//! |--------|----------|-----------|--------------|
//! | Telemadrid | `https://www.telemadrid.es` | `/<cat>/` segment and `.html` suffix | path only |
//! | OkDiario | `https://okdiario.com` | URL starts with `<base>/<cat>/` | page fetch |
//! | El Mundo | `https://www.elmundo.es` | `/<cat>/` segment or `/<cat>.html` | page fetch |

use crate::models::{Category, Source};
use crate::scrapers::Extractor;
use url::Url;

/// Cheap, network-free check that a URL's shape fits a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRule {
    /// The URL must start with `<base>/<category>/`.
    CategoryPrefix,
    /// The URL must contain `/<category>/` or `/<category>.html`.
    CategorySegmentOrPage,
    /// The URL must contain `/<category>/` and end in `.html`.
    CategorySegmentHtml,
}

impl PathRule {
    pub fn accepts(self, base_url: &str, category: Category, url: &str) -> bool {
        let cat = category.id();
        let segment = format!("/{cat}/");
        match self {
            PathRule::CategoryPrefix => url.starts_with(&format!("{base_url}{segment}")),
            PathRule::CategorySegmentOrPage => {
                url.contains(&segment) || url.contains(&format!("/{cat}.html"))
            }
            PathRule::CategorySegmentHtml => url.contains(&segment) && url.ends_with(".html"),
        }
    }
}

/// Whether passing the path rule is enough to accept a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The source's listing pages are reliably sectioned by path.
    PathOnly,
    /// The article page must be fetched and inspected.
    FetchPage,
}

/// Static description of one outlet.
#[derive(Debug)]
pub struct SourceProfile {
    pub source: Source,
    /// Scheme and host, no trailing slash.
    pub base_url: &'static str,
    listings: [(Category, &'static str); 3],
    pub path_rule: PathRule,
    pub verification: Verification,
    pub extractor: Extractor,
}

impl SourceProfile {
    /// The section page listing articles for `category`.
    pub fn listing_url(&self, category: Category) -> &'static str {
        self.listings
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, url)| *url)
            .unwrap_or(self.base_url)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.listings.iter().map(|(c, _)| *c)
    }

    /// Parsed base URL, used to resolve relative links.
    pub fn base(&self) -> Url {
        Url::parse(self.base_url).expect("source base URLs are valid")
    }

    pub fn host(&self) -> &'static str {
        self.base_url
            .split_once("://")
            .map(|(_, host)| host)
            .unwrap_or(self.base_url)
    }
}

pub static PROFILES: [SourceProfile; 3] = [
    SourceProfile {
        source: Source::Telemadrid,
        base_url: "https://www.telemadrid.es",
        listings: [
            (Category::Deportes, "https://www.telemadrid.es/deportes/"),
            (Category::Economia, "https://www.telemadrid.es/noticias/economia/"),
            (Category::Internacional, "https://www.telemadrid.es/noticias/internacional/"),
        ],
        path_rule: PathRule::CategorySegmentHtml,
        verification: Verification::PathOnly,
        extractor: Extractor::Telemadrid,
    },
    SourceProfile {
        source: Source::ElMundo,
        base_url: "https://www.elmundo.es",
        listings: [
            (Category::Deportes, "https://www.elmundo.es/deportes.html"),
            (Category::Economia, "https://www.elmundo.es/economia.html"),
            (Category::Internacional, "https://www.elmundo.es/internacional.html"),
        ],
        path_rule: PathRule::CategorySegmentOrPage,
        verification: Verification::FetchPage,
        extractor: Extractor::ElMundo,
    },
    SourceProfile {
        source: Source::OkDiario,
        base_url: "https://okdiario.com",
        listings: [
            (Category::Deportes, "https://okdiario.com/deportes/"),
            (Category::Economia, "https://okdiario.com/economia/"),
            (Category::Internacional, "https://okdiario.com/internacional/"),
        ],
        path_rule: PathRule::CategoryPrefix,
        verification: Verification::FetchPage,
        extractor: Extractor::OkDiario,
    },
];

impl Source {
    /// The table row for this source.
    pub fn profile(self) -> &'static SourceProfile {
        PROFILES
            .iter()
            .find(|p| p.source == self)
            .expect("every source has a profile")
    }
}
