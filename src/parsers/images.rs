use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static SIZE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"s-l\d+").expect("Invalid size token regex"));
static TINY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"s-l64\b").expect("Invalid tiny token regex"));
static WEBP_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.webp$").expect("Invalid webp regex"));

/// Rewrite the image host's size token to request `largest` instead.
pub fn upgrade_size_token(url: &str, largest: &str) -> String {
    SIZE_TOKEN.replace_all(url, largest).into_owned()
}

/// Thumbnails are served as webp; the full-size JPEG lives at the same path.
pub fn thumbnail_fallback_url(thumbnail: &str, largest: &str) -> String {
    let upgraded = upgrade_size_token(thumbnail, largest);
    WEBP_SUFFIX.replace(&upgraded, ".jpg").into_owned()
}

/// 64px filmstrip renditions; not worth upgrading from the carousel.
pub fn is_tiny_thumbnail(url: &str) -> bool {
    TINY_TOKEN.is_match(url)
}

pub fn image_extension(url: &str) -> &'static str {
    if url.contains(".webp") {
        "webp"
    } else {
        "jpg"
    }
}

/// `main.<ext>` for the cover, `detail-N.<ext>` for the rest.
pub fn image_filename(index: usize, url: &str) -> String {
    let ext = image_extension(url);
    if index == 0 {
        format!("main.{ext}")
    } else {
        format!("detail-{index}.{ext}")
    }
}

pub fn dedupe_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|url| seen.insert(url.clone())).collect()
}
