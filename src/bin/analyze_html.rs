use anyhow::Result;
use scraper::{Html, Selector};
use std::fs;

use gallery_harvest::config::Config;
use gallery_harvest::scrapers::selectors::{item, search};
use gallery_harvest::scrapers::{extract_stubs, find_next_page, parse_item_page};
use gallery_harvest::utils::http::{create_client, fetch_page};

fn report(document: &Html, label: &str, selectors: &[&str]) {
    println!("{label}:");
    for css in selectors {
        match Selector::parse(css) {
            Ok(selector) => {
                let count = document.select(&selector).count();
                println!("  '{}' matched {} elements", css, count);
            }
            Err(e) => println!("  '{}' failed to parse: {:?}", css, e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let client = create_client(&config)?;

    // Search results
    let search_url = config.seller_search_url();
    println!("Fetching seller search page {search_url}...");
    let page = fetch_page(&client, &search_url).await?;
    fs::write("search_sample.html", &page.html)?;

    {
        let document = page.document();
        report(&document, "Cards", &[search::CARD_WAIT_CSS, "li.s-card"]);
        report(&document, "Card titles", search::CARD_TITLE_CSS);
        report(&document, "Card prices", search::CARD_PRICE_CSS);
        report(&document, "Card thumbnails", search::CARD_THUMBNAIL_CSS);
        report(&document, "Next page", search::NEXT_PAGE_CSS);
    }

    let stubs = extract_stubs(&page, &config);
    println!("Extracted {} listing stubs", stubs.len());
    println!("Next page: {:?}", find_next_page(&page));

    let Some(first) = stubs.first() else {
        println!("No listings to inspect further");
        return Ok(());
    };

    // First item page
    println!("\nFetching item page {}...", first.item_url);
    let item_page = fetch_page(&client, &first.item_url).await?;
    fs::write("item_sample.html", &item_page.html)?;

    {
        let document = item_page.document();
        report(&document, "Carousel", &[item::CAROUSEL_CSS]);
        report(&document, "Filmstrip", &[item::FILMSTRIP_CSS]);
        report(&document, "Main image", item::MAIN_IMAGE_CSS);
        report(&document, "Description", item::DESCRIPTION_CSS);
        report(&document, "Description frame", item::DESCRIPTION_FRAME_CSS);
    }

    let details = parse_item_page(&item_page, &config.images);
    println!("Image URLs: {}", details.image_urls.len());
    println!("Description chars: {}", details.description.chars().count());
    println!("Description frame: {:?}", details.description_frame);
    println!("Specs: {:?}", details.specs);

    Ok(())
}
