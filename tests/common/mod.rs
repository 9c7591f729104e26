#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use url::Url;

use gallery_harvest::config::Config;
use gallery_harvest::scrapers::{Page, PageSource};
use gallery_harvest::utils::download::{FetchError, ImageFetcher};

pub const SEARCH_URL: &str = "https://www.ebay.co.uk/sch/i.html?_ssn=jacquelineperryart&_ipg=240";
pub const PROFILE_URL: &str = "https://www.ebay.co.uk/usr/jacquelineperryart";

/// Config pointed at a scratch directory, with every wait and delay zeroed.
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.data_file = root.join("data").join("artworks.json");
    config.paths.images_dir = root.join("images");
    config.timing.card_wait_short_ms = 0;
    config.timing.card_wait_long_ms = 0;
    config.timing.card_poll_ms = 1;
    config.timing.delay_min_ms = 0;
    config.timing.delay_max_ms = 0;
    config
}

/// Recorded marketplace. Each URL serves its responses in order, repeating the last.
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, Vec<String>>,
    served: Mutex<HashMap<String, usize>>,
    opened: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.entry(url.to_string()).or_default().push(html.to_string());
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn open_count(&self, url: &str) -> usize {
        self.opened().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl PageSource for FakeSite {
    async fn open(&self, url: &str) -> Result<Page> {
        self.opened.lock().unwrap().push(url.to_string());

        let responses = self
            .pages
            .get(url)
            .ok_or_else(|| anyhow!("navigation timeout: {url}"))?;
        let mut served = self.served.lock().unwrap();
        let index = served.entry(url.to_string()).or_insert(0);
        let html = responses[(*index).min(responses.len() - 1)].clone();
        *index += 1;

        Ok(Page::new(Url::parse(url)?, html))
    }
}

/// Image host stand-in: writes `size` bytes for known URLs, 404s otherwise.
#[derive(Default)]
pub struct FakeImages {
    sizes: HashMap<String, usize>,
    requested: Mutex<Vec<String>>,
}

impl FakeImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(mut self, url: &str, size: usize) -> Self {
        self.sizes.insert(url.to_string(), size);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for FakeImages {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());

        let Some(size) = self.sizes.get(url) else {
            return Err(FetchError::Status {
                status: StatusCode::NOT_FOUND,
                url: url.to_string(),
            });
        };
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, vec![0xAB; *size])?;
        Ok(*size as u64)
    }
}
