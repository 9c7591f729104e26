use anyhow::{Context, Result};
use scraper::Html;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ImageConfig};
use crate::models::{ArtworkRecord, ListingStub, Slug};
use crate::parsers::{
    clean_description, collect_specs, dedupe_urls, element_raw_text, element_text, first_match,
    generate_slug, image_filename, is_tiny_thumbnail, normalize_price, thumbnail_fallback_url,
    upgrade_size_token, TitleCleaner,
};
use crate::scrapers::selectors::item;
use crate::scrapers::{Page, PageSource};
use crate::utils::download::{remove_partial, ImageFetcher};

/// Shortest inline description block taken as real text.
const MIN_INLINE_DESCRIPTION_CHARS: usize = 10;

/// Images declaring at least this width count as full-size.
const FULL_SIZE_MIN_WIDTH: u32 = 200;

const FULL_SIZE_TOKENS: [&str; 2] = ["s-l500", "s-l1600"];

/// Everything read off an item page, before any download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDetails {
    pub image_urls: Vec<String>,
    pub description: String,
    /// Where the description lives when the page embeds it in a frame.
    pub description_frame: Option<String>,
    pub specs: BTreeMap<String, String>,
}

type ImageStrategy = fn(&Html, &ImageConfig) -> Vec<String>;

/// Most specific first; the first strategy that yields anything wins.
const IMAGE_STRATEGIES: [(&str, ImageStrategy); 4] = [
    ("carousel", carousel_images),
    ("filmstrip", filmstrip_images),
    ("main image", main_image),
    ("full-size scan", full_size_images),
];

fn carousel_images(document: &Html, images: &ImageConfig) -> Vec<String> {
    document
        .select(&item::CAROUSEL)
        .filter_map(|img| {
            let value = img.value();
            ["src", "data-zoom-src", "data-src"]
                .iter()
                .filter_map(|attr| value.attr(attr))
                .find(|src| !src.trim().is_empty())
        })
        .filter(|src| !is_tiny_thumbnail(src) && src.contains(&images.host_marker))
        .map(str::to_string)
        .collect()
}

fn filmstrip_images(document: &Html, images: &ImageConfig) -> Vec<String> {
    document
        .select(&item::FILMSTRIP)
        .filter_map(|img| {
            let value = img.value();
            value
                .attr("src")
                .filter(|src| !src.trim().is_empty())
                .or_else(|| value.attr("data-src"))
        })
        .filter(|src| src.contains(&images.host_marker))
        .map(str::to_string)
        .collect()
}

fn main_image(document: &Html, images: &ImageConfig) -> Vec<String> {
    first_match(document.root_element(), &item::MAIN_IMAGE)
        .and_then(|img| img.value().attr("src"))
        .filter(|src| src.contains(&images.host_marker))
        .map(|src| vec![src.to_string()])
        .unwrap_or_default()
}

fn full_size_images(document: &Html, images: &ImageConfig) -> Vec<String> {
    document
        .select(&item::ANY_IMAGE)
        .filter_map(|img| {
            let value = img.value();
            let src = value.attr("src")?;
            if !src.contains(&images.host_marker) {
                return None;
            }
            let wide = value
                .attr("width")
                .and_then(|w| w.trim().parse::<u32>().ok())
                .map_or(false, |w| w > FULL_SIZE_MIN_WIDTH);
            let sized = FULL_SIZE_TOKENS.iter().any(|token| src.contains(token));
            (wide || sized).then(|| src.to_string())
        })
        .collect()
}

/// Image URLs at the largest rendition, duplicates removed, page order kept.
pub fn extract_image_urls(document: &Html, images: &ImageConfig) -> Vec<String> {
    for (name, strategy) in IMAGE_STRATEGIES {
        let found = strategy(document, images);
        if !found.is_empty() {
            debug!("Image strategy '{}' found {} URLs", name, found.len());
            let upgraded = found
                .iter()
                .map(|url| upgrade_size_token(url, &images.largest_size_token))
                .collect();
            return dedupe_urls(upgraded);
        }
    }
    Vec::new()
}

fn inline_description(document: &Html) -> String {
    let root = document.root_element();
    item::DESCRIPTION
        .iter()
        .filter_map(|selector| root.select(selector).next())
        .map(element_raw_text)
        .find(|text| text.chars().count() > MIN_INLINE_DESCRIPTION_CHARS)
        .unwrap_or_default()
}

fn find_description_frame(document: &Html, page: &Page) -> Option<String> {
    first_match(document.root_element(), &item::DESCRIPTION_FRAME)
        .and_then(|frame| frame.value().attr("src"))
        .and_then(|src| page.resolve(src))
        .map(|url| url.to_string())
}

fn spec_pairs(document: &Html) -> Vec<(String, String)> {
    document
        .select(&item::SPEC_ROW)
        .filter_map(|row| {
            let label = row.select(&item::SPEC_LABEL).next()?;
            let value = row.select(&item::SPEC_VALUE).next()?;
            Some((element_text(label), element_text(value)))
        })
        .collect()
}

/// Read images, description and item specifics off a detail page.
pub fn parse_item_page(page: &Page, images: &ImageConfig) -> ItemDetails {
    let document = page.document();
    let description = inline_description(&document);
    let description_frame = if description.is_empty() {
        find_description_frame(&document, page)
    } else {
        None
    };

    ItemDetails {
        image_urls: extract_image_urls(&document, images),
        description,
        description_frame,
        specs: collect_specs(spec_pairs(&document)),
    }
}

fn frame_body_text(page: &Page) -> String {
    let document = page.document();
    document
        .select(&item::BODY)
        .next()
        .map(element_raw_text)
        .unwrap_or_default()
}

/// Turns a stub into a full record, downloading its images on the way.
pub struct DetailExtractor {
    source: Arc<dyn PageSource>,
    fetcher: Arc<dyn ImageFetcher>,
    config: Arc<Config>,
    cleaner: TitleCleaner,
}

impl DetailExtractor {
    pub fn new(
        source: Arc<dyn PageSource>,
        fetcher: Arc<dyn ImageFetcher>,
        config: Arc<Config>,
    ) -> Self {
        let cleaner = TitleCleaner::new(&config.seller.display_name);
        Self {
            source,
            fetcher,
            config,
            cleaner,
        }
    }

    /// Slug a stub's record would be stored under.
    pub fn slug_for(&self, stub: &ListingStub) -> Slug {
        generate_slug(&self.cleaner.clean(&stub.title))
    }

    /// `None` means "skip this stub"; the reason has already been logged.
    pub async fn extract(&self, stub: &ListingStub) -> Option<ArtworkRecord> {
        match self.try_extract(stub).await {
            Ok(record) => record,
            Err(e) => {
                error!("Error scraping {}: {:#}", stub.item_url, e);
                None
            }
        }
    }

    async fn try_extract(&self, stub: &ListingStub) -> Result<Option<ArtworkRecord>> {
        let title = self.cleaner.clean(&stub.title);
        let slug = generate_slug(&title);

        info!("Scraping: {}", title);
        info!("  URL: {}", stub.item_url);

        if slug.is_empty() {
            warn!("  Title {:?} has no usable slug, skipping", stub.title);
            return Ok(None);
        }

        let page = self
            .source
            .open(&stub.item_url)
            .await
            .with_context(|| format!("Failed to open item page {}", stub.item_url))?;

        let details = parse_item_page(&page, &self.config.images);
        info!("  Found {} images", details.image_urls.len());

        let mut description = details.description;
        if description.is_empty() {
            if let Some(frame_url) = details.description_frame.as_deref() {
                description = self.read_description_frame(frame_url).await;
            }
        }

        let urls = if details.image_urls.is_empty() && !stub.thumbnail_url.is_empty() {
            info!("  Falling back to listing thumbnail");
            vec![thumbnail_fallback_url(
                &stub.thumbnail_url,
                &self.config.images.largest_size_token,
            )]
        } else {
            details.image_urls
        };

        let images = self.download_images(&slug, &urls).await?;
        if images.is_empty() {
            warn!("  No images for \"{}\", skipping", title);
            return Ok(None);
        }

        Ok(Some(ArtworkRecord {
            slug,
            title,
            price: normalize_price(&stub.price),
            description: clean_description(&description),
            specs: details.specs,
            images,
            ebay_url: Some(stub.item_url.clone()),
        }))
    }

    async fn read_description_frame(&self, frame_url: &str) -> String {
        match self.source.open(frame_url).await {
            Ok(frame) => frame_body_text(&frame),
            Err(e) => {
                debug!("Description frame unavailable ({}): {:#}", frame_url, e);
                String::new()
            }
        }
    }

    /// Downloads in order; a failed or undersized image is dropped, never retried.
    /// A directory left with nothing in it is removed again.
    async fn download_images(&self, slug: &Slug, urls: &[String]) -> Result<Vec<String>> {
        let dir = self.config.paths.images_dir.join(slug.as_str());
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create image directory {}", dir.display()))?;

        let min_bytes = self.config.images.min_bytes;
        let mut saved = Vec::new();

        for (index, url) in urls.iter().enumerate() {
            let filename = image_filename(index, url);
            let dest = dir.join(&filename);

            if let Err(e) = self.fetcher.fetch(url, &dest).await {
                error!("  Failed to download image {}: {}", index, e);
                continue;
            }

            match fs::metadata(&dest).await {
                Ok(meta) if meta.len() > min_bytes => {
                    info!("  Downloaded: {} ({}KB)", filename, meta.len() / 1024);
                    saved.push(filename);
                }
                Ok(meta) => {
                    debug!("  Discarding placeholder image {} ({} bytes)", filename, meta.len());
                    remove_partial(&dest).await;
                }
                Err(e) => error!("  Downloaded image {} is unreadable: {}", filename, e),
            }
        }

        if saved.is_empty() {
            // Only succeeds when empty, so earlier files are never touched
            if fs::remove_dir(&dir).await.is_ok() {
                debug!("  Removed empty image directory {}", dir.display());
            }
        }

        Ok(saved)
    }
}
