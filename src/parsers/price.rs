use once_cell::sync::Lazy;
use regex::Regex;

static GBP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"£[\d,.]+").expect("Invalid GBP regex")
});

static USD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$[\d,.]+").expect("Invalid USD regex")
});

/// Pull the currency amount out of a card price ("£45.00 Buy it now" -> "£45.00").
///
/// Sterling wins over dollars; anything unrecognised is kept verbatim.
pub fn normalize_price(raw: &str) -> String {
    GBP_REGEX
        .find(raw)
        .or_else(|| USD_REGEX.find(raw))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| raw.to_string())
}
