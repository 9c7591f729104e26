use anyhow::Result;
use crate::models::ArtworkRecord;

mod json;
pub use json::JsonStore;

/// Invoked by the pipeline after every successful record with the full,
/// deduplicated set collected so far.
pub trait Checkpoint {
    fn save(&mut self, records: &[ArtworkRecord]) -> Result<()>;
}
