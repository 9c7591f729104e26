use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// A sentence break is only used for truncation when it lies past this offset.
pub const MIN_SENTENCE_CUT: usize = 200;

/// Everything from these markers on is injected page script, not seller prose.
const INJECTION_MARKERS: [&str; 2] = ["/* ssgST:", "$M_"];

static JSON_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{["\s]*_type["\s]*:[\s\S]*$"#).expect("Invalid JSON tail regex")
});

static LINE_BREAK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>").expect("Invalid br regex")
});

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"));

static BLANK_LINES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n(?:[^\S\n]*\n){2,}").expect("Invalid blank line regex")
});

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\S\n]{2,}").expect("Invalid space regex")
});

/// Normalize a scraped description into presentable prose.
///
/// Total over all strings. Paragraph breaks survive (at most one blank line in
/// a row); anything longer than [`MAX_DESCRIPTION_CHARS`] is cut back to the
/// last full sentence when one ends past [`MIN_SENTENCE_CUT`].
pub fn clean_description(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let mut desc = raw;
    for marker in INJECTION_MARKERS {
        if let Some(index) = desc.find(marker) {
            desc = &desc[..index];
        }
    }

    let desc = JSON_TAIL.replace(desc, "");
    let desc = desc.replace("&nbsp;", " ");
    let desc = LINE_BREAK_TAG.replace_all(&desc, "\n");
    let desc = HTML_TAG.replace_all(&desc, "");
    let desc = decode_html_entities(&desc).replace('\u{a0}', " ");
    let desc = desc.replace("\r\n", "\n");
    let desc = BLANK_LINES.replace_all(&desc, "\n\n");
    let desc = MULTI_SPACE.replace_all(&desc, " ");

    truncate_at_sentence(desc.trim())
}

fn truncate_at_sentence(desc: &str) -> String {
    if desc.chars().count() <= MAX_DESCRIPTION_CHARS {
        return desc.to_string();
    }

    let cut = desc
        .char_indices()
        .nth(MAX_DESCRIPTION_CHARS)
        .map(|(index, _)| index)
        .unwrap_or(desc.len());
    let head = &desc[..cut];

    match head.rfind('.') {
        Some(period) if head[..period].chars().count() > MIN_SENTENCE_CUT => {
            head[..=period].to_string()
        }
        _ => head.trim_end().to_string(),
    }
}
