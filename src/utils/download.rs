use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::LOCATION;
use reqwest::{Client, StatusCode};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid image URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected status {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("redirect from {0} has no usable Location header")]
    MissingLocation(String),
    #[error("more than {limit} redirects starting at {url}")]
    TooManyRedirects { url: String, limit: u8 },
}

/// Retrieves one image to disk. Implementations never retry; the caller decides
/// what a failure means.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Returns the number of bytes written to `dest`.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

enum Hop {
    Written(u64),
    Redirect(Url),
}

pub struct HttpImageFetcher {
    client: Client,
    max_redirects: u8,
}

impl HttpImageFetcher {
    /// `client` must not follow redirects itself (see `create_image_client`).
    pub fn new(client: Client, max_redirects: u8) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    async fn fetch_once(&self, url: &Url, dest: &Path) -> Result<Hop, FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status.is_redirection() {
            let next = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|location| url.join(location).ok())
                .ok_or_else(|| FetchError::MissingLocation(url.to_string()))?;
            return Ok(Hop::Redirect(next));
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let mut file = fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(Hop::Written(written))
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut current = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        for _ in 0..=self.max_redirects {
            match self.fetch_once(&current, dest).await {
                Ok(Hop::Written(bytes)) => return Ok(bytes),
                Ok(Hop::Redirect(next)) => {
                    remove_partial(dest).await;
                    debug!("Redirected {} -> {}", current, next);
                    current = next;
                }
                Err(e) => {
                    remove_partial(dest).await;
                    return Err(e);
                }
            }
        }

        remove_partial(dest).await;
        Err(FetchError::TooManyRedirects {
            url: url.to_string(),
            limit: self.max_redirects,
        })
    }
}

pub async fn remove_partial(dest: &Path) {
    if let Err(e) = fs::remove_file(dest).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!("Could not remove partial file {}: {}", dest.display(), e);
        }
    }
}
