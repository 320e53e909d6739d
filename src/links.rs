//! Candidate link discovery on section listing pages.
//!
//! A listing page links to far more than articles: navigation, other
//! sections, social networks, ads. This stage only narrows links down to
//! absolute same-site `http(s)` URLs; deciding which are articles of the
//! right category is the classifier's job.

use crate::fetch::PageFetcher;
use crate::models::Source;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Fetch a listing page and return its candidate article URLs.
///
/// A listing page that cannot be fetched yields no links.
#[instrument(level = "info", skip(fetcher))]
pub async fn collect<F: PageFetcher>(
    fetcher: &F,
    source: Source,
    listing_url: &str,
) -> Vec<String> {
    let html = match fetcher.fetch(listing_url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "Listing page unavailable");
            return Vec::new();
        }
    };
    let links = collect_links(source, &html);
    info!(count = links.len(), "Collected candidate links");
    links
}

/// Extract same-site absolute URLs from listing HTML.
///
/// Relative links are resolved against the source's base URL, fragments are
/// removed, and duplicates are dropped keeping first-seen order.
pub fn collect_links(source: Source, html: &str) -> Vec<String> {
    let profile = source.profile();
    let base = profile.base();
    let host = profile.host();
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let mut url = base.join(href.trim()).ok()?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str() != Some(host) {
                return None;
            }
            url.set_fragment(None);
            Some(url.to_string())
        })
        .unique()
        .inspect(|url| debug!(%url, "Candidate link"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubFetcher;

    const LISTING: &str = r##"<html><body>
        <a href="/deportes/futbol-1">Fútbol</a>
        <a href="https://okdiario.com/deportes/tenis-2">Tenis</a>
        <a href="/deportes/futbol-1#comentarios">Comentarios</a>
        <a href="https://twitter.com/okdiario">Twitter</a>
        <a href="https://www.okdiario.com/deportes/otro">Subdominio</a>
        <a href="mailto:redaccion@okdiario.com">Correo</a>
        <a href="javascript:void(0)">Menú</a>
        <a href="economia/bolsa-3">Relativo</a>
        <a>Sin destino</a>
        <a href="/deportes/tenis-2">Tenis otra vez</a>
    </body></html>"##;

    #[test]
    fn test_collect_links_filters_and_orders() {
        let links = collect_links(Source::OkDiario, LISTING);
        assert_eq!(
            links,
            vec![
                "https://okdiario.com/deportes/futbol-1",
                "https://okdiario.com/deportes/tenis-2",
                "https://okdiario.com/economia/bolsa-3",
            ]
        );
    }

    #[test]
    fn test_collect_links_uses_source_host() {
        let html = r#"<a href="/economia/2024/05/01/abc.html">a</a>
                      <a href="https://okdiario.com/economia/x">b</a>"#;
        let links = collect_links(Source::ElMundo, html);
        assert_eq!(links, vec!["https://www.elmundo.es/economia/2024/05/01/abc.html"]);
    }

    #[tokio::test]
    async fn test_collect_fetch_failure_is_empty() {
        let fetcher = StubFetcher::new();
        let links = collect(&fetcher, Source::OkDiario, "https://okdiario.com/deportes/").await;
        assert!(links.is_empty());
        assert_eq!(fetcher.calls(), vec!["https://okdiario.com/deportes/"]);
    }

    #[tokio::test]
    async fn test_collect_fetches_listing() {
        let fetcher = StubFetcher::new().with_page("https://okdiario.com/deportes/", LISTING);
        let links = collect(&fetcher, Source::OkDiario, "https://okdiario.com/deportes/").await;
        assert_eq!(links.len(), 3);
    }
}
