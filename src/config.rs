use ::config::{Config as Settings, File};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Optional overlay read from the working directory (`gallery.toml`).
pub const CONFIG_FILE_STEM: &str = "gallery";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub seller: SellerConfig,
    pub paths: PathsConfig,
    pub timing: TimingConfig,
    pub images: ImageConfig,
    pub user_agent: String,
    pub accept_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SellerConfig {
    /// Marketplace username, used for the profile page and the search fallback.
    pub id: String,
    /// Name the seller puts into listing titles; stripped by the title cleaner.
    pub display_name: String,
    pub base_url: String,
    /// Substring a link must carry to count as "on the marketplace".
    pub site_marker: String,
    /// Domain an item URL must contain.
    pub item_domain: String,
    /// Path segment that marks a detail page.
    pub item_path_marker: String,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_file: PathBuf,
    pub images_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub navigation_timeout_secs: u64,
    pub card_wait_short_ms: u64,
    pub card_wait_long_ms: u64,
    pub card_poll_ms: u64,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Files at or below this size are placeholder/error images.
    pub min_bytes: u64,
    pub max_redirects: u8,
    /// Marker a URL must contain to be treated as a listing photo.
    pub host_marker: String,
    /// Size token requested for every image (`s-l1600` is the largest rendition).
    pub largest_size_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seller: SellerConfig::default(),
            paths: PathsConfig::default(),
            timing: TimingConfig::default(),
            images: ImageConfig::default(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "en-GB,en;q=0.9".to_string(),
        }
    }
}

impl Default for SellerConfig {
    fn default() -> Self {
        Self {
            id: "jacquelineperryart".to_string(),
            display_name: "Jacqueline Perry".to_string(),
            base_url: "https://www.ebay.co.uk".to_string(),
            site_marker: "ebay".to_string(),
            item_domain: "ebay.co.uk".to_string(),
            item_path_marker: "/itm/".to_string(),
            page_size: 240,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data").join("artworks.json"),
            images_dir: PathBuf::from("public").join("images").join("artworks"),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 60,
            card_wait_short_ms: 15_000,
            card_wait_long_ms: 300_000,
            card_poll_ms: 5_000,
            delay_min_ms: 2_000,
            delay_max_ms: 5_000,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            min_bytes: 1_000,
            max_redirects: 5,
            host_marker: "ebayimg".to_string(),
            largest_size_token: "s-l1600".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Hardcoded defaults, optionally overridden by gallery.toml
        let settings = Settings::builder()
            .add_source(File::with_name(CONFIG_FILE_STEM).required(false))
            .build()
            .context("Failed to read gallery configuration")?;

        settings
            .try_deserialize::<Config>()
            .context("Invalid gallery configuration")
    }

    pub fn profile_url(&self) -> String {
        format!("{}/usr/{}", self.seller.base_url, self.seller.id)
    }

    /// Search-by-seller URL used when the profile has no "see all" link.
    pub fn seller_search_url(&self) -> String {
        let page_size = self.seller.page_size.to_string();
        let query = serde_urlencoded::to_string([
            ("_ssn", self.seller.id.as_str()),
            ("_ipg", page_size.as_str()),
        ])
        .unwrap_or_default();
        format!("{}/sch/i.html?{}", self.seller.base_url, query)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.timing.navigation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_single_operator_setup() {
        let config = Config::default();
        assert_eq!(config.profile_url(), "https://www.ebay.co.uk/usr/jacquelineperryart");
        assert_eq!(
            config.seller_search_url(),
            "https://www.ebay.co.uk/sch/i.html?_ssn=jacquelineperryart&_ipg=240"
        );
        assert_eq!(config.images.min_bytes, 1_000);
        assert_eq!(config.images.max_redirects, 5);
    }

    #[test]
    fn load_without_overlay_uses_defaults() {
        let config = Config::load().unwrap();
        assert_eq!(config.seller.id, "jacquelineperryart");
        assert_eq!(config.paths.data_file, PathBuf::from("data/artworks.json"));
    }
}
