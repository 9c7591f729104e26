use std::collections::BTreeMap;

use crate::models::{SPEC_DIMENSIONS, SPEC_FRAMING, SPEC_MEDIUM, SPEC_STYLE};

/// Map a marketplace "item specifics" label onto a spec key.
///
/// Returns `None` for labels the gallery does not show.
pub fn classify_label(label: &str) -> Option<String> {
    let key = label.trim().trim_end_matches(':').trim().to_lowercase();
    if key.is_empty() {
        return None;
    }

    let canonical = if key.contains("medium") || key.contains("material") {
        SPEC_MEDIUM
    } else if key.contains("dimension") || key.contains("size") {
        SPEC_DIMENSIONS
    } else if key.contains("style") {
        SPEC_STYLE
    } else if key.contains("frame") || key.contains("framing") {
        SPEC_FRAMING
    } else if key.contains("type") || key.contains("subject") {
        return Some(key);
    } else {
        return None;
    };

    Some(canonical.to_string())
}

/// Build the spec map from label/value pairs in page order; later pairs win.
pub fn collect_specs<I, L, V>(pairs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (L, V)>,
    L: AsRef<str>,
    V: AsRef<str>,
{
    let mut specs = BTreeMap::new();
    for (label, value) in pairs {
        let value = value.as_ref().trim();
        if value.is_empty() || value == "N/A" {
            continue;
        }
        if let Some(key) = classify_label(label.as_ref()) {
            specs.insert(key, value.to_string());
        }
    }
    specs
}
