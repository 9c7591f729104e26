use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;
use url::Url;

mod detail;
mod listings;
pub mod selectors;

pub use detail::{parse_item_page, DetailExtractor, ItemDetails};
pub use listings::{
    extract_stubs, find_next_page, find_seller_items_link, has_listing_cards, ListingDiscoverer,
};

/// Owned snapshot of a navigated page.
///
/// `scraper::Html` is not `Send`, so pages travel as text and are parsed inside
/// the synchronous extraction functions.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub html: String,
}

impl Page {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Absolute form of an `href`/`src` found on this page.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() || href.starts_with("javascript:") {
            return None;
        }
        self.url.join(href).ok()
    }
}

/// The navigation capability: whatever drives the "browser tab".
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn open(&self, url: &str) -> Result<Page>;
}
