use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::models::ListingStub;
use crate::parsers::{element_text, first_match};
use crate::scrapers::selectors::search;
use crate::scrapers::{Page, PageSource};
use crate::utils::delay::Politeness;

/// Link texts that lead from the seller profile to the full item list.
const SEE_ALL_PHRASES: [&str; 3] = ["see all", "items for sale", "all items"];

/// Filler cards the marketplace mixes into results.
const PLACEHOLDER_TITLE: &str = "Shop on eBay";
const PLACEHOLDER_PREFIX: &str = "Shop on";

/// Walks the seller's result pages and collects every listing card.
pub struct ListingDiscoverer {
    source: Arc<dyn PageSource>,
    config: Arc<Config>,
    delay: Politeness,
}

impl ListingDiscoverer {
    pub fn new(source: Arc<dyn PageSource>, config: Arc<Config>) -> Self {
        let delay = Politeness::from_config(&config.timing);
        Self {
            source,
            config,
            delay,
        }
    }

    /// All stubs across all pages, in page order. Never fails: an unreachable
    /// page ends discovery with whatever was collected so far.
    pub async fn discover(&self) -> Vec<ListingStub> {
        let mut url = self.locate_seller_items().await;
        let mut visited = HashSet::new();
        let mut stubs = Vec::new();
        let mut page_num = 1;

        loop {
            visited.insert(url.clone());
            info!("Scraping page {}...", page_num);

            let Some(page) = self.wait_for_cards(&url).await else {
                warn!("Giving up on {}: no listing cards appeared", url);
                break;
            };

            let found = extract_stubs(&page, &self.config);
            info!("  Found {} listings on page {}", found.len(), page_num);
            stubs.extend(found);

            let Some(next) = find_next_page(&page) else {
                info!("  No more pages.");
                break;
            };
            if visited.contains(&next) {
                warn!("  Next page {} was already visited, stopping", next);
                break;
            }

            info!("  Next page: {}", next);
            self.delay.pause().await;
            url = next;
            page_num += 1;
        }

        stubs
    }

    /// Profile "see all items" link if there is one, else the search-by-seller URL.
    async fn locate_seller_items(&self) -> String {
        let profile_url = self.config.profile_url();
        info!("Navigating to seller profile: {}", profile_url);

        match self.source.open(&profile_url).await {
            Ok(page) => {
                if let Some(link) = find_seller_items_link(&page, &self.config.seller.site_marker) {
                    info!("Found items link: {}", link);
                    return link;
                }
            }
            Err(e) => error!("Could not open seller profile: {:#}", e),
        }

        let search_url = self.config.seller_search_url();
        info!("Trying direct search: {}", search_url);
        search_url
    }

    /// Short wait, then one long wait (room for a human to clear a challenge page).
    async fn wait_for_cards(&self, url: &str) -> Option<Page> {
        match self.source.open(url).await {
            Ok(page) if has_listing_cards(&page) => return Some(page),
            Ok(_) => debug!("No listing cards on first load of {}", url),
            Err(e) => error!("Failed to open {}: {:#}", url, e),
        }

        let timing = &self.config.timing;
        if let Some(page) = self
            .poll_for_cards(url, Duration::from_millis(timing.card_wait_short_ms))
            .await
        {
            return Some(page);
        }

        warn!(
            "Could not find listing cards, waiting up to {}s for manual intervention...",
            timing.card_wait_long_ms / 1000
        );
        self.poll_for_cards(url, Duration::from_millis(timing.card_wait_long_ms))
            .await
    }

    async fn poll_for_cards(&self, url: &str, window: Duration) -> Option<Page> {
        let poll = Duration::from_millis(self.config.timing.card_poll_ms.max(1));
        let deadline = Instant::now() + window;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            sleep(poll.min(deadline - now)).await;

            match self.source.open(url).await {
                Ok(page) if has_listing_cards(&page) => return Some(page),
                Ok(_) => debug!("Still no listing cards on {}", url),
                Err(e) => warn!("Reload of {} failed: {:#}", url, e),
            }
        }
    }
}

pub fn has_listing_cards(page: &Page) -> bool {
    page.document().select(&search::CARD_WAIT).next().is_some()
}

/// The profile link whose text reads like "see all items" and that stays on the marketplace.
pub fn find_seller_items_link(page: &Page, site_marker: &str) -> Option<String> {
    let document = page.document();

    document.select(&search::ANY_LINK).find_map(|link| {
        let text = element_text(link).to_lowercase();
        if !SEE_ALL_PHRASES.iter().any(|phrase| text.contains(phrase)) {
            return None;
        }
        let target = page.resolve(link.value().attr("href")?)?;
        let on_site = target
            .host_str()
            .map_or(false, |host| host.contains(site_marker));
        on_site.then(|| target.to_string())
    })
}

fn is_placeholder(title: &str) -> bool {
    title.is_empty() || title == PLACEHOLDER_TITLE || title.starts_with(PLACEHOLDER_PREFIX)
}

/// One stub per real listing card on a result page.
pub fn extract_stubs(page: &Page, config: &Config) -> Vec<ListingStub> {
    let document = page.document();
    let seller = &config.seller;
    let mut stubs = Vec::new();

    for card in document.select(&search::CARD) {
        let title = first_match(card, &search::CARD_TITLE)
            .map(element_text)
            .unwrap_or_default();
        if is_placeholder(&title) {
            continue;
        }

        let item_url = card
            .select(&search::ANY_LINK)
            .filter_map(|link| page.resolve(link.value().attr("href")?))
            .map(|url| url.to_string())
            .find(|url| {
                url.contains(&seller.item_path_marker) && url.contains(&seller.item_domain)
            });
        let Some(item_url) = item_url else {
            debug!("Skipping card without item link: {}", title);
            continue;
        };

        let price = first_match(card, &search::CARD_PRICE)
            .map(element_text)
            .unwrap_or_default();

        let thumbnail_url = first_match(card, &search::CARD_THUMBNAIL)
            .and_then(|img| {
                let value = img.value();
                value
                    .attr("src")
                    .filter(|src| !src.trim().is_empty())
                    .or_else(|| value.attr("data-src"))
            })
            .and_then(|src| page.resolve(src))
            .map(|url| url.to_string())
            .unwrap_or_default();

        stubs.push(ListingStub {
            title,
            price,
            thumbnail_url,
            item_url,
        });
    }

    stubs
}

/// Follow the first "next page" control found, trying each selector in turn.
pub fn find_next_page(page: &Page) -> Option<String> {
    let document = page.document();
    let root = document.root_element();

    search::NEXT_PAGE.iter().find_map(|selector| {
        root.select(selector)
            .filter_map(|link| page.resolve(link.value().attr("href")?))
            .map(|url| url.to_string())
            .next()
    })
}
