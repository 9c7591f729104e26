//! CSS selectors for marketplace pages.
//!
//! Chains are tried in order; the first selector that matches anything wins.
//! Update these when the marketplace markup shifts (`analyze_html` reports
//! per-selector match counts against live pages).

use once_cell::sync::Lazy;
use scraper::Selector;

fn one(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("Invalid selector {css:?}: {e:?}"))
}

fn chain(list: &[&str]) -> Vec<Selector> {
    list.iter().map(|css| one(css)).collect()
}

/// Seller profile and search results.
pub mod search {
    use super::*;

    pub const CARD_WAIT_CSS: &str = ".s-card";

    pub static CARD_WAIT: Lazy<Selector> = Lazy::new(|| one(CARD_WAIT_CSS));

    pub static CARD: Lazy<Selector> = Lazy::new(|| one("li.s-card"));

    pub static ANY_LINK: Lazy<Selector> = Lazy::new(|| one("a[href]"));

    pub const CARD_TITLE_CSS: &[&str] = &[
        ".su-card-container__header a.s-card__link",
        ".s-card__title a",
        ".s-card__title",
    ];
    pub static CARD_TITLE: Lazy<Vec<Selector>> = Lazy::new(|| chain(CARD_TITLE_CSS));

    pub const CARD_PRICE_CSS: &[&str] = &[
        ".s-card__price .s-card__price--main",
        ".s-card__price",
        "[class*='price']",
    ];
    pub static CARD_PRICE: Lazy<Vec<Selector>> = Lazy::new(|| chain(CARD_PRICE_CSS));

    pub const CARD_THUMBNAIL_CSS: &[&str] = &[
        "img.s-card__image",
        "img[src*='ebayimg']",
        "img[data-src*='ebayimg']",
    ];
    pub static CARD_THUMBNAIL: Lazy<Vec<Selector>> = Lazy::new(|| chain(CARD_THUMBNAIL_CSS));

    pub const NEXT_PAGE_CSS: &[&str] = &[
        "a.pagination__next",
        "a[aria-label='Next page']",
        "nav a[rel='next']",
    ];
    pub static NEXT_PAGE: Lazy<Vec<Selector>> = Lazy::new(|| chain(NEXT_PAGE_CSS));
}

/// Item detail pages.
pub mod item {
    use super::*;

    pub const CAROUSEL_CSS: &str = ".ux-image-carousel-item img";
    pub static CAROUSEL: Lazy<Selector> = Lazy::new(|| one(CAROUSEL_CSS));

    pub const FILMSTRIP_CSS: &str = "button[data-idx] img, .ux-image-filmstrip img";
    pub static FILMSTRIP: Lazy<Selector> = Lazy::new(|| one(FILMSTRIP_CSS));

    pub const MAIN_IMAGE_CSS: &[&str] = &[
        "#icImg",
        ".ux-image-magnify__container img",
        "img[itemprop='image']",
    ];
    pub static MAIN_IMAGE: Lazy<Vec<Selector>> = Lazy::new(|| chain(MAIN_IMAGE_CSS));

    pub static ANY_IMAGE: Lazy<Selector> = Lazy::new(|| one("img"));

    pub const DESCRIPTION_CSS: &[&str] = &[
        ".x-item-description-child",
        "[data-testid='x-item-description']",
        "#desc_div",
        ".item-description",
    ];
    pub static DESCRIPTION: Lazy<Vec<Selector>> = Lazy::new(|| chain(DESCRIPTION_CSS));

    pub const DESCRIPTION_FRAME_CSS: &[&str] = &[
        "iframe#desc_ifr",
        "iframe[name='desc_ifr']",
        "iframe[src*='vi/description']",
    ];
    pub static DESCRIPTION_FRAME: Lazy<Vec<Selector>> = Lazy::new(|| chain(DESCRIPTION_FRAME_CSS));

    pub static SPEC_ROW: Lazy<Selector> = Lazy::new(|| one(".ux-labels-values"));
    pub static SPEC_LABEL: Lazy<Selector> =
        Lazy::new(|| one(".ux-labels-values__labels .ux-textspans"));
    pub static SPEC_VALUE: Lazy<Selector> =
        Lazy::new(|| one(".ux-labels-values__values .ux-textspans"));

    pub static BODY: Lazy<Selector> = Lazy::new(|| one("body"));
}
