pub mod description;
pub mod images;
pub mod price;
pub mod slug;
pub mod specs;
pub mod title;

pub use description::*;
pub use images::*;
pub use price::*;
pub use slug::*;
pub use specs::*;
pub use title::*;

use html_escape::decode_html_entities;
use scraper::{ElementRef, Selector};

/// Clean and normalize text by removing extra whitespace and decoding HTML entities
pub fn clean_text(text: &str) -> String {
    let decoded = decode_html_entities(text);
    decoded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whitespace-normalized text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Text content with line structure intact, only trimmed at the ends.
pub fn element_raw_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First element matched by the earliest selector in `chain` that matches anything.
pub fn first_match<'a>(scope: ElementRef<'a>, chain: &[Selector]) -> Option<ElementRef<'a>> {
    chain
        .iter()
        .find_map(|selector| scope.select(selector).next())
}
