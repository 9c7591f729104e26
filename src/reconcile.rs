use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::models::{dedupe_by_slug, ArtworkRecord, Slug};
use crate::parsers::{clean_description, generate_slug, TitleCleaner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: Slug,
    pub to: Slug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    /// Another directory already holds the new name; the source is left alone.
    TargetExists,
    SourceMissing,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub records: Vec<ArtworkRecord>,
    pub input_count: usize,
    pub renames: Vec<(Rename, RenameOutcome)>,
    /// Image directories no record points at. Reported, never deleted.
    pub orphans: Vec<String>,
    /// `(slug, filename)` pairs listed in the store but absent on disk.
    pub missing_images: Vec<(Slug, String)>,
}

impl ReconcileReport {
    pub fn duplicates_dropped(&self) -> usize {
        self.input_count - self.records.len()
    }

    pub fn count(&self, outcome: &RenameOutcome) -> usize {
        self.renames.iter().filter(|(_, o)| o == outcome).count()
    }
}

/// Re-derives titles, slugs and descriptions for a loaded store and lines the
/// image tree up with the result.
pub struct Reconciler {
    image_root: PathBuf,
    cleaner: TitleCleaner,
}

impl Reconciler {
    pub fn new(image_root: impl Into<PathBuf>, cleaner: TitleCleaner) -> Self {
        Self {
            image_root: image_root.into(),
            cleaner,
        }
    }

    pub fn reconcile(&self, records: Vec<ArtworkRecord>) -> Result<ReconcileReport> {
        let input_count = records.len();
        info!("Processing {} artworks...", input_count);

        let (rewritten, renames) = self.rewrite(records);
        let unique = dedupe_by_slug(rewritten);
        info!("Unique artworks after dedup: {} (from {})", unique.len(), input_count);

        let renames = self.apply_renames(renames);
        info!(
            "Renamed {} image directories",
            renames.iter().filter(|(_, o)| *o == RenameOutcome::Renamed).count()
        );

        let valid: HashSet<&str> = unique.iter().map(|r| r.slug.as_str()).collect();
        let orphans = self.find_orphans(&valid)?;
        if !orphans.is_empty() {
            warn!("Found {} orphaned image directories (not removed)", orphans.len());
        }

        let missing_images = self.check_images(&unique);

        Ok(ReconcileReport {
            records: unique,
            input_count,
            renames,
            orphans,
            missing_images,
        })
    }

    /// Clean every record in place and queue a rename wherever the slug moved.
    pub fn rewrite(&self, records: Vec<ArtworkRecord>) -> (Vec<ArtworkRecord>, Vec<Rename>) {
        let mut renames = Vec::new();
        let rewritten = records
            .into_iter()
            .map(|mut record| {
                record.title = self.cleaner.clean(&record.title);
                record.description = clean_description(&record.description);
                let slug = generate_slug(&record.title);
                if slug != record.slug {
                    renames.push(Rename {
                        from: record.slug.clone(),
                        to: slug.clone(),
                    });
                }
                record.slug = slug;
                record
            })
            .collect();

        (rewritten, renames)
    }

    /// Applied in queue order, so the first record to claim a name keeps it.
    pub fn apply_renames(&self, renames: Vec<Rename>) -> Vec<(Rename, RenameOutcome)> {
        renames
            .into_iter()
            .map(|rename| {
                let outcome = self.apply_rename(&rename);
                (rename, outcome)
            })
            .collect()
    }

    fn apply_rename(&self, rename: &Rename) -> RenameOutcome {
        let from = self.image_root.join(rename.from.as_str());
        let to = self.image_root.join(rename.to.as_str());

        if rename.from.is_empty() || rename.to.is_empty() {
            warn!(
                "  Refusing rename involving the image root: {:?} -> {:?}",
                rename.from, rename.to
            );
            return RenameOutcome::Failed("empty slug".to_string());
        }
        if !from.is_dir() {
            debug!("  No image directory for {}", rename.from);
            return RenameOutcome::SourceMissing;
        }
        if to.exists() {
            warn!("  Skipping rename (target exists): {} -> {}", rename.from, rename.to);
            return RenameOutcome::TargetExists;
        }

        match fs::rename(&from, &to) {
            Ok(()) => {
                debug!("  Renamed {} -> {}", rename.from, rename.to);
                RenameOutcome::Renamed
            }
            Err(e) => {
                error!("  Failed to rename {} -> {}: {}", rename.from, rename.to, e);
                RenameOutcome::Failed(e.to_string())
            }
        }
    }

    pub fn find_orphans(&self, valid: &HashSet<&str>) -> Result<Vec<String>> {
        if !self.image_root.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.image_root)
            .with_context(|| format!("Failed to list {}", self.image_root.display()))?;

        let mut orphans = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !valid.contains(name.as_str()) {
                warn!("  Orphaned directory: {}", name);
                orphans.push(name);
            }
        }
        orphans.sort();

        Ok(orphans)
    }

    /// Every listed image must exist at `<root>/<slug>/<file>`.
    pub fn check_images(&self, records: &[ArtworkRecord]) -> Vec<(Slug, String)> {
        let mut missing = Vec::new();
        for record in records {
            let dir = self.image_root.join(record.slug.as_str());
            if record.images.is_empty() {
                warn!("  {} lists no images", record.slug);
            }
            for image in &record.images {
                if !dir.join(image).is_file() {
                    warn!("  Missing image {}/{}", record.slug, image);
                    missing.push((record.slug.clone(), image.clone()));
                }
            }
        }
        missing
    }
}
