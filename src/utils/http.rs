use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};

use crate::config::Config;
use crate::scrapers::{Page, PageSource};

fn base_builder(config: &Config) -> Result<ClientBuilder> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language).context("Invalid Accept-Language value")?,
    );

    Ok(ClientBuilder::new()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.navigation_timeout())
        .pool_max_idle_per_host(2))
}

/// Client for page navigation: follows redirects and keeps marketplace cookies.
pub fn create_client(config: &Config) -> Result<Client> {
    let client = base_builder(config)?.cookie_store(true).build()?;

    Ok(client)
}

/// Client for image downloads; redirects are followed by hand so they can be capped.
pub fn create_image_client(config: &Config) -> Result<Client> {
    let client = base_builder(config)?.redirect(Policy::none()).build()?;

    Ok(client)
}

/// Single-attempt page fetch. A failed navigation is the caller's unit failure, never retried here.
pub async fn fetch_page(client: &Client, url: &str) -> Result<Page> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to navigate to {}", url))?;

    let status = response.status();
    if !status.is_success() {
        warn!("HTTP error {}: {}", status, url);
        return Err(anyhow::anyhow!("HTTP error {} for {}", status, url));
    }

    // Relative links resolve against where we ended up, not where we started
    let final_url = response.url().clone();
    let html = response
        .text()
        .await
        .with_context(|| format!("Failed to read body of {}", url))?;
    debug!("Fetched {} ({} bytes)", final_url, html.len());

    Ok(Page::new(final_url, html))
}

/// Plain-HTTP stand-in for a browser tab.
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn open(&self, url: &str) -> Result<Page> {
        fetch_page(&self.client, url).await
    }
}
