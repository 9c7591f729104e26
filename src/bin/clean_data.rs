use anyhow::Result;
use tracing::{info, warn};

use gallery_harvest::config::Config;
use gallery_harvest::parsers::TitleCleaner;
use gallery_harvest::reconcile::{Reconciler, RenameOutcome};
use gallery_harvest::storage::JsonStore;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gallery_harvest=info".parse()?)
                .add_directive("clean_data=info".parse()?),
        )
        .init();

    let config = Config::load()?;
    let store = JsonStore::new(&config.paths.data_file);
    let records = store.load()?;

    let reconciler = Reconciler::new(
        &config.paths.images_dir,
        TitleCleaner::new(&config.seller.display_name),
    );
    let report = reconciler.reconcile(records)?;

    let skipped = report.count(&RenameOutcome::TargetExists);
    if skipped > 0 {
        warn!("{} renames skipped because the target already existed", skipped);
    }
    if !report.missing_images.is_empty() {
        warn!("{} listed images are missing on disk", report.missing_images.len());
    }
    info!("Dropped {} duplicate records", report.duplicates_dropped());

    store.save(&report.records)?;
    info!("Saved {} cleaned artworks to {}", report.records.len(), store.path().display());

    info!("Sample titles:");
    for art in report.records.iter().take(5) {
        info!("  - {} ({})", art.title, art.price);
        info!("    Slug: {}", art.slug);
        info!("    Desc: {}...", art.description.chars().take(100).collect::<String>());
    }

    Ok(())
}
