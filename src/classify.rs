//! Category verification for candidate links.
//!
//! Listing pages are noisy and URL paths are not trustworthy on every
//! outlet, so a link is accepted in two tiers:
//!
//! 1. **Fast filter**: the source's [`PathRule`](crate::sources::PathRule)
//!    on the URL alone. A rejection here is final and costs no request.
//!    For path-only sources a pass is also final.
//! 2. **Verification**: fetch the page and look for a [`Signal`] naming the
//!    category, checked in a fixed order. The first signal found wins; the
//!    signals are never weighed against each other.
//!
//! A verification fetch that fails is a plain "no match".

use crate::fetch::PageFetcher;
use crate::models::{Category, Source};
use crate::sources::Verification;
use crate::utils::normalize_label;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

static META: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").expect("valid selector"));
static LINKED_DATA: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector")
});
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// `<meta>` keys that carry the page's section.
pub const SECTION_META_KEYS: [&str; 5] = [
    "article:section",
    "section",
    "parsely-section",
    "page-section",
    "cg.section",
];

/// Which piece of page evidence confirmed the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A section `<meta>` tag mentions the category.
    SectionMeta,
    /// JSON-LD `articleSection` or a breadcrumb entry names the category.
    LinkedData,
    /// A link's text is the category name or its target is the section path.
    Anchor,
}

/// Tier 0: does the URL's shape fit `category` on `source`?
pub fn fast_filter(source: Source, category: Category, url: &str) -> bool {
    let profile = source.profile();
    profile.path_rule.accepts(profile.base_url, category, url)
}

/// Decide whether `url`, found on `source`'s listing for `category`,
/// really belongs to that category.
#[instrument(level = "debug", skip(fetcher))]
pub async fn matches<F: PageFetcher>(
    fetcher: &F,
    source: Source,
    category: Category,
    url: &str,
) -> bool {
    if !fast_filter(source, category, url) {
        debug!("Rejected by path rule");
        return false;
    }
    if source.profile().verification == Verification::PathOnly {
        return true;
    }

    let html = match fetcher.fetch(url).await {
        Ok(html) => html,
        Err(e) => {
            debug!(error = %e, "Verification fetch failed");
            return false;
        }
    };
    match find_signal(&html, category) {
        Some(signal) => {
            debug!(?signal, "Category confirmed");
            true
        }
        None => {
            debug!("No category signal on page");
            false
        }
    }
}

/// Tier 1 on an already fetched page: the first signal naming `category`.
pub fn find_signal(html: &str, category: Category) -> Option<Signal> {
    let document = Html::parse_document(html);
    if section_meta_matches(&document, category) {
        return Some(Signal::SectionMeta);
    }
    if linked_data_matches(&document, category) {
        return Some(Signal::LinkedData);
    }
    if anchor_matches(&document, category) {
        return Some(Signal::Anchor);
    }
    None
}

fn section_meta_matches(document: &Html, category: Category) -> bool {
    document.select(&META).any(|meta| {
        let el = meta.value();
        let key = el
            .attr("property")
            .filter(|k| !k.is_empty())
            .or_else(|| el.attr("name"))
            .unwrap_or_default()
            .to_lowercase();
        if !SECTION_META_KEYS.contains(&key.as_str()) {
            return false;
        }
        let content = normalize_label(el.attr("content").unwrap_or_default());
        category.equivalents().iter().any(|e| content.contains(e))
    })
}

/// Patterns over normalized JSON-LD text for one category.
struct LinkedDataPatterns {
    section: Regex,
    breadcrumb_name: Regex,
}

static LINKED_DATA_PATTERNS: Lazy<Vec<(Category, LinkedDataPatterns)>> = Lazy::new(|| {
    Category::ALL
        .into_iter()
        .map(|category| {
            let alternatives = category
                .equivalents()
                .iter()
                .map(|e| regex::escape(e))
                .collect::<Vec<_>>()
                .join("|");
            let patterns = LinkedDataPatterns {
                section: Regex::new(&format!(
                    r#""articlesection"\s*:\s*\[?\s*"(?:{alternatives})"#
                ))
                .expect("valid regex"),
                breadcrumb_name: Regex::new(&format!(r#""name"\s*:\s*"(?:{alternatives})""#))
                    .expect("valid regex"),
            };
            (category, patterns)
        })
        .collect()
});

fn linked_data_matches(document: &Html, category: Category) -> bool {
    let Some((_, patterns)) = LINKED_DATA_PATTERNS.iter().find(|(c, _)| *c == category) else {
        return false;
    };
    document.select(&LINKED_DATA).any(|script| {
        let text = normalize_label(&script.text().collect::<String>());
        if text.is_empty() {
            return false;
        }
        patterns.section.is_match(&text)
            || (text.contains("breadcrumblist") && patterns.breadcrumb_name.is_match(&text))
    })
}

fn anchor_matches(document: &Html, category: Category) -> bool {
    let section_path = format!("/{}/", category.id());
    document.select(&ANCHOR).any(|a| {
        let text = a.text().collect::<String>();
        if category.is_equivalent(&text) {
            return true;
        }
        a.value()
            .attr("href")
            .is_some_and(|href| href.to_lowercase().contains(&section_path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubFetcher;

    const OK_DEPORTES: &str = "https://okdiario.com/deportes/articulo-x";
    const OK_ECONOMIA: &str = "https://okdiario.com/economia/articulo-x";

    fn page(head: &str, body: &str) -> String {
        format!("<html><head>{head}</head><body>{body}</body></html>")
    }

    #[test]
    fn test_section_meta_signal() {
        let html = page(r#"<meta property="article:section" content="Economía y Empresas">"#, "");
        assert_eq!(find_signal(&html, Category::Economia), Some(Signal::SectionMeta));
        assert_eq!(find_signal(&html, Category::Deportes), None);
    }

    #[test]
    fn test_section_meta_synonym_and_name_key() {
        let html = page(r#"<meta name="parsely-section" content="Negocios">"#, "");
        assert_eq!(find_signal(&html, Category::Economia), Some(Signal::SectionMeta));
    }

    #[test]
    fn test_empty_property_falls_back_to_name() {
        let html = page(r#"<meta property="" name="section" content="Deportes">"#, "");
        assert_eq!(find_signal(&html, Category::Deportes), Some(Signal::SectionMeta));
    }

    #[test]
    fn test_unrecognized_meta_key_ignored() {
        let html = page(r#"<meta name="keywords" content="deportes, futbol">"#, "");
        assert_eq!(find_signal(&html, Category::Deportes), None);
    }

    #[test]
    fn test_linked_data_article_section() {
        let html = page(
            r#"<script type="application/ld+json">
                {"@type": "NewsArticle", "articleSection": "Internacional"}
            </script>"#,
            "",
        );
        assert_eq!(find_signal(&html, Category::Internacional), Some(Signal::LinkedData));
    }

    #[test]
    fn test_linked_data_article_section_array() {
        let html = page(
            r#"<script type="application/ld+json">{"articleSection":["Mundo","Europa"]}</script>"#,
            "",
        );
        assert_eq!(find_signal(&html, Category::Internacional), Some(Signal::LinkedData));
    }

    #[test]
    fn test_linked_data_breadcrumb() {
        let html = page(
            r#"<script type="application/ld+json">
                {"@type":"BreadcrumbList","itemListElement":[
                  {"@type":"ListItem","position":1,"name":"Portada"},
                  {"@type":"ListItem","position":2,"name":"Deportes"}]}
            </script>"#,
            "",
        );
        assert_eq!(find_signal(&html, Category::Deportes), Some(Signal::LinkedData));
    }

    #[test]
    fn test_breadcrumb_name_must_be_exact() {
        let html = page(
            r#"<script type="application/ld+json">
                {"@type":"BreadcrumbList","itemListElement":[{"name":"Deportes de invierno"}]}
            </script>"#,
            "",
        );
        assert_eq!(find_signal(&html, Category::Deportes), None);
    }

    #[test]
    fn test_name_without_breadcrumb_list_ignored() {
        let html = page(
            r#"<script type="application/ld+json">{"author":{"name":"Deportes"}}</script>"#,
            "",
        );
        assert_eq!(find_signal(&html, Category::Deportes), None);
    }

    #[test]
    fn test_anchor_text_signal() {
        let html = page("", r#"<nav><a href="/seccion/7"> Economía </a></nav>"#);
        assert_eq!(find_signal(&html, Category::Economia), Some(Signal::Anchor));
    }

    #[test]
    fn test_anchor_href_signal() {
        let html = page("", r#"<a href="https://okdiario.com/Deportes/futbol/">Más</a>"#);
        assert_eq!(find_signal(&html, Category::Deportes), Some(Signal::Anchor));
    }

    #[test]
    fn test_first_signal_wins() {
        // Wrong meta, right anchor: the anchor still confirms.
        let html = page(
            r#"<meta property="article:section" content="Política">"#,
            r#"<a href="/internacional/">Internacional</a>"#,
        );
        assert_eq!(find_signal(&html, Category::Internacional), Some(Signal::Anchor));

        let html = page(
            r#"<meta property="article:section" content="Internacional">"#,
            r#"<a href="/internacional/">Internacional</a>"#,
        );
        assert_eq!(find_signal(&html, Category::Internacional), Some(Signal::SectionMeta));
    }

    #[test]
    fn test_fast_filter_scenarios() {
        assert!(fast_filter(Source::OkDiario, Category::Deportes, OK_DEPORTES));
        assert!(!fast_filter(Source::OkDiario, Category::Deportes, OK_ECONOMIA));
    }

    #[tokio::test]
    async fn test_fast_filter_reject_makes_no_request() {
        let fetcher = StubFetcher::new().with_page(
            OK_ECONOMIA,
            page(r#"<meta property="article:section" content="Deportes">"#, ""),
        );
        assert!(!matches(&fetcher, Source::OkDiario, Category::Deportes, OK_ECONOMIA).await);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_verified_match_fetches_once() {
        let fetcher = StubFetcher::new().with_page(
            OK_DEPORTES,
            page(r#"<meta property="article:section" content="Deportes">"#, ""),
        );
        assert!(matches(&fetcher, Source::OkDiario, Category::Deportes, OK_DEPORTES).await);
        assert_eq!(fetcher.calls_to(OK_DEPORTES), 1);
    }

    #[tokio::test]
    async fn test_page_without_signal_is_rejected() {
        let fetcher = StubFetcher::new().with_page(OK_DEPORTES, page("", "<p>Sin sección</p>"));
        assert!(!matches(&fetcher, Source::OkDiario, Category::Deportes, OK_DEPORTES).await);
    }

    #[tokio::test]
    async fn test_verification_fetch_failure_is_no_match() {
        let fetcher = StubFetcher::new();
        assert!(!matches(&fetcher, Source::OkDiario, Category::Deportes, OK_DEPORTES).await);
        assert_eq!(fetcher.calls_to(OK_DEPORTES), 1);
    }

    #[tokio::test]
    async fn test_path_only_source_skips_verification() {
        let fetcher = StubFetcher::new();
        let url = "https://www.telemadrid.es/deportes/futbol/gol-1-2345.html";
        assert!(matches(&fetcher, Source::Telemadrid, Category::Deportes, url).await);
        assert!(fetcher.calls().is_empty());
    }
}
