//! Category listing page parsing

use percent_encoding::percent_decode_str;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::document::flatten_text;

static LISTING_LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div#mw-pages div.mw-category-group a")
        .expect("static listing selector is valid")
});

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static anchor selector is valid"));

const NEXT_PAGE_TEXT: &str = "next page";

/// Articles listed on one category page, plus the link to the next page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPage {
    /// Article identifiers in listing order, possibly with repeats
    pub articles: Vec<String>,

    /// Absolute URL of the following listing page
    pub next_page: Option<Url>,
}

/// Parse a category listing page fetched from `page_url`
pub fn parse_category_page(html: &str, page_url: &Url) -> CategoryPage {
    let document = Html::parse_document(html);

    let articles = document
        .select(&LISTING_LINK_SELECTOR)
        .filter_map(article_identifier)
        .collect::<Vec<_>>();

    let next_page = document
        .select(&ANCHOR_SELECTOR)
        .find(|a| flatten_text(*a, |_| false) == NEXT_PAGE_TEXT)
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| match page_url.join(href) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("Ignoring unparsable next page link '{}': {}", href, e);
                None
            }
        });

    CategoryPage {
        articles,
        next_page,
    }
}

/// Decoded identifier for a listing link, or `None` for sub-categories,
/// list articles and links that do not point at an article
fn article_identifier(link: ElementRef<'_>) -> Option<String> {
    let title = link.value().attr("title")?;
    let href = link.value().attr("href")?;

    if href.contains("/wiki/Category:") || title.to_lowercase().starts_with("list of") {
        return None;
    }

    let (_, path) = href.split_once("/wiki/")?;
    let path = path.split(['#', '?']).next().unwrap_or_default();
    let identifier = percent_decode_str(path)
        .decode_utf8_lossy()
        .replace('_', " ");
    if identifier.trim().is_empty() {
        None
    } else {
        Some(identifier)
    }
}
