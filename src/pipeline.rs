use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{ArtworkRecord, ListingStub, Slug};
use crate::scrapers::{DetailExtractor, ListingDiscoverer, PageSource};
use crate::storage::Checkpoint;
use crate::utils::delay::Politeness;
use crate::utils::download::ImageFetcher;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no listings found for seller {0}")]
    NoListings(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    /// Records saved; unique by slug.
    pub extracted: usize,
    /// Stubs whose slug an earlier record already held.
    pub duplicates: usize,
    /// Stubs that failed or had no usable image.
    pub skipped: usize,
}

/// Discovery, then one detail pass per stub, checkpointing after each success.
pub struct Pipeline {
    discoverer: ListingDiscoverer,
    extractor: DetailExtractor,
    delay: Politeness,
    seller: String,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn PageSource>,
        fetcher: Arc<dyn ImageFetcher>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            discoverer: ListingDiscoverer::new(source.clone(), config.clone()),
            extractor: DetailExtractor::new(source, fetcher, config.clone()),
            delay: Politeness::from_config(&config.timing),
            seller: config.seller.id.clone(),
        }
    }

    pub async fn run(&self, checkpoint: &mut dyn Checkpoint) -> Result<RunSummary> {
        info!("Phase 1: Scraping seller listing pages...");
        let stubs = self.discoverer.discover().await;
        info!("Found {} total listings", stubs.len());

        if stubs.is_empty() {
            return Err(PipelineError::NoListings(self.seller.clone()).into());
        }

        for (i, stub) in stubs.iter().take(3).enumerate() {
            info!("  {}. {} - {}", i + 1, stub.title, stub.price);
            info!("     {}", stub.item_url.chars().take(80).collect::<String>());
        }

        info!("Phase 2: Scraping individual listing pages...");
        self.process(&stubs, checkpoint).await
    }

    /// Serial detail extraction. A checkpoint failure aborts the run; everything
    /// saved before it stays on disk.
    ///
    /// A stub whose slug an earlier record already claimed is skipped before any
    /// download, so it can never overwrite or delete that record's images.
    pub async fn process(
        &self,
        stubs: &[ListingStub],
        checkpoint: &mut dyn Checkpoint,
    ) -> Result<RunSummary> {
        let mut records: Vec<ArtworkRecord> = Vec::new();
        let mut claimed: HashSet<Slug> = HashSet::new();
        let mut duplicates = 0;

        for (i, stub) in stubs.iter().enumerate() {
            info!("[{}/{}]", i + 1, stubs.len());

            let slug = self.extractor.slug_for(stub);
            if claimed.contains(&slug) {
                warn!("  Duplicate of an earlier listing ({}), skipping {}", slug, stub.item_url);
                duplicates += 1;
                continue;
            }

            if let Some(record) = self.extractor.extract(stub).await {
                claimed.insert(record.slug.clone());
                records.push(record);
                checkpoint.save(&records)?;
            }

            if i + 1 < stubs.len() {
                self.delay.pause().await;
            }
        }

        if records.is_empty() {
            warn!("Nothing extracted; store left untouched");
        } else {
            checkpoint.save(&records)?;
        }

        let summary = RunSummary {
            discovered: stubs.len(),
            extracted: records.len(),
            duplicates,
            skipped: stubs.len() - records.len() - duplicates,
        };
        info!(
            "Saved {} artworks ({} duplicates, {} skipped of {} listings)",
            summary.extracted, summary.duplicates, summary.skipped, summary.discovered
        );

        Ok(summary)
    }
}
