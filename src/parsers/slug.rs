use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Slug;

pub const MAX_SLUG_LEN: usize = 80;

static NON_ALNUM_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-z0-9]+").expect("Invalid slug regex")
});

/// Derive the URL/directory identifier for a title.
///
/// Output is lowercase `[a-z0-9-]`, at most [`MAX_SLUG_LEN`] characters, with no
/// leading or trailing hyphen. Distinct titles may collide; callers dedupe.
pub fn generate_slug(title: &str) -> Slug {
    let lower = title.to_lowercase();
    let hyphenated = NON_ALNUM_RUN.replace_all(&lower, "-");
    let mut slug = hyphenated.trim_matches('-').to_string();

    // ASCII only at this point, byte truncation is safe
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        slug.truncate(slug.trim_end_matches('-').len());
    }

    Slug(slug)
}
