use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use tracing::info;

use gallery_harvest::config::Config;
use gallery_harvest::pipeline::Pipeline;
use gallery_harvest::storage::JsonStore;
use gallery_harvest::utils::download::HttpImageFetcher;
use gallery_harvest::utils::http::{create_client, create_image_client, HttpPageSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gallery_harvest=info".parse()?),
        )
        .init();

    let config = Arc::new(Config::load()?);
    info!(
        "Starting listing scrape for seller {} at {}",
        config.seller.id,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    std::fs::create_dir_all(&config.paths.images_dir)?;

    let source = Arc::new(HttpPageSource::new(create_client(&config)?));
    let fetcher = Arc::new(HttpImageFetcher::new(
        create_image_client(&config)?,
        config.images.max_redirects,
    ));

    let mut store = JsonStore::new(&config.paths.data_file);
    let pipeline = Pipeline::new(source, fetcher, config.clone());

    // Zero listings surfaces here as an error and a non-zero exit
    let summary = pipeline.run(&mut store).await?;

    info!(
        "Saved {} artworks to {}",
        summary.extracted,
        store.path().display()
    );
    info!("Images saved to {}", config.paths.images_dir.display());

    Ok(())
}
