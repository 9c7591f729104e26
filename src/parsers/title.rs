use once_cell::sync::Lazy;
use regex::Regex;

// Marketplace chrome that leaks into card titles
static CHROME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)Opens in a new window or tab",
        r"(?i)Opens in a window or tab",
        r"(?i)New listing",
    ])
});

static KEYWORD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\bNEW\b",
        r"(?i)\bORIGINAL\b",
        r"(?i)\bFREE (P&P|SHIPPING|POSTAGE|DELIVERY)\b",
        r"(?i)\bSIGNED\b",
    ])
});

static TRAILING_KEYWORD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[r"(?i)\bUnique Gift\b", r"(?i)\bUnique\b", r"(?i)\bOpens\b$"])
});

static DOUBLE_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*,\s*").expect("Invalid comma regex"));
static TRAILING_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\s*-)+\s*$").expect("Invalid dash regex"));
static LEADING_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:-\s*)+").expect("Invalid dash regex"));
static MULTI_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("Invalid space regex"));

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("Invalid title pattern"))
        .collect()
}

/// Turns marketplace card titles into gallery titles.
///
/// Seller self-references depend on the configured display name, so the
/// cleaner is built once per run rather than being a free function.
#[derive(Debug, Clone)]
pub struct TitleCleaner {
    seller_patterns: Vec<Regex>,
}

impl TitleCleaner {
    pub fn new(seller_display_name: &str) -> Self {
        let name = seller_display_name.trim();
        let seller_patterns = if name.is_empty() {
            Vec::new()
        } else {
            let escaped = regex::escape(name);
            compile(&[
                &format!(r"(?i)\bby {escaped}\b"),
                &format!(r"(?i)\b{escaped}\b"),
            ])
        };
        Self { seller_patterns }
    }

    pub fn clean(&self, raw: &str) -> String {
        let mut title = raw.to_string();

        // Token removal first, so the whitespace pass below sees the gaps
        for pattern in CHROME_PATTERNS
            .iter()
            .chain(KEYWORD_PATTERNS.iter())
            .chain(self.seller_patterns.iter())
            .chain(TRAILING_KEYWORD_PATTERNS.iter())
        {
            title = pattern.replace_all(&title, "").into_owned();
        }

        let title = DOUBLE_COMMA.replace_all(&title, ", ");
        let title = TRAILING_DASH.replace(&title, "");
        let title = LEADING_DASH.replace(&title, "");
        let title = MULTI_SPACE.replace_all(&title, " ");

        title.trim().to_string()
    }
}
