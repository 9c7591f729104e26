mod common;

use anyhow::{anyhow, Result};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use common::{test_config, FakeImages, FakeSite, PROFILE_URL, SEARCH_URL};
use gallery_harvest::config::Config;
use gallery_harvest::models::ArtworkRecord;
use gallery_harvest::pipeline::{Pipeline, PipelineError, RunSummary};
use gallery_harvest::scrapers::ListingDiscoverer;
use gallery_harvest::storage::{Checkpoint, JsonStore};

const PAGE_TWO: &str = "https://www.ebay.co.uk/sch/i.html?_ssn=jacquelineperryart&_pgn=2";

fn card(title: &str, item: &str, price: &str, thumb: &str) -> String {
    format!(
        r#"<li class="s-card">
             <div class="su-card-container__header"><a class="s-card__link" href="{item}">{title}</a></div>
             <div class="s-card__price">{price}</div>
             <img class="s-card__image" src="{thumb}">
           </li>"#
    )
}

fn results(cards: &[String], next: Option<&str>) -> String {
    let next = next
        .map(|href| format!(r#"<a class="pagination__next" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!("<html><body><ul>{}</ul>{}</body></html>", cards.join("\n"), next)
}

fn site() -> FakeSite {
    let page_one = results(
        &[
            card("NEW Red Sunset", "https://www.ebay.co.uk/itm/1", "£45.00 Buy it now", ""),
            card(
                "Harbour Lights Opens in a new window or tab",
                "https://www.ebay.co.uk/itm/2",
                "£60.00",
                "",
            ),
            card("Red Sunset ORIGINAL", "https://www.ebay.co.uk/itm/3", "£45.00", ""),
        ],
        Some("/sch/i.html?_ssn=jacquelineperryart&_pgn=2"),
    );
    let page_two = results(
        &[
            card("Empty Frame", "https://www.ebay.co.uk/itm/4", "£5.00", ""),
            card(
                "Meadow",
                "https://www.ebay.co.uk/itm/5",
                "US $30.00",
                "https://i.ebayimg.com/images/g/t5/s-l225.webp",
            ),
            card("Broken Link", "https://www.ebay.co.uk/itm/6", "£1.00", ""),
        ],
        // Points back at page one; discovery must not loop
        Some(SEARCH_URL),
    );

    FakeSite::new()
        .page(SEARCH_URL, &page_one)
        .page(PAGE_TWO, &page_two)
        .page(
            "https://www.ebay.co.uk/itm/1",
            r#"
            <div class="ux-image-carousel-item"><img src="https://i.ebayimg.com/images/g/a1/s-l500.jpg"></div>
            <div class="ux-image-carousel-item"><img src="https://i.ebayimg.com/images/g/a2/s-l500.webp"></div>
            <div class="x-item-description-child">Warm evening sky over the bay. /* ssgST: {"a":1} */</div>
            <div class="ux-labels-values">
              <div class="ux-labels-values__labels"><span class="ux-textspans">Medium:</span></div>
              <div class="ux-labels-values__values"><span class="ux-textspans">Acrylic</span></div>
            </div>
            "#,
        )
        .page(
            "https://www.ebay.co.uk/itm/2",
            r#"
            <img id="icImg" src="https://i.ebayimg.com/images/g/b1/s-l300.jpg">
            <iframe id="desc_ifr" src="https://vi.vipr.ebaydesc.com/ws/desc?item=2"></iframe>
            "#,
        )
        .page(
            "https://vi.vipr.ebaydesc.com/ws/desc?item=2",
            "<html><body><p>Harbour at night.</p>\n<p>Framed in oak.</p></body></html>",
        )
        .page(
            "https://www.ebay.co.uk/itm/3",
            r#"<div class="ux-image-carousel-item"><img src="https://i.ebayimg.com/images/g/c1/s-l500.jpg"></div>"#,
        )
        .page("https://www.ebay.co.uk/itm/4", "<p>No photos</p>")
        .page("https://www.ebay.co.uk/itm/5", "<p>No photos</p>")
}

fn images() -> FakeImages {
    FakeImages::new()
        .image("https://i.ebayimg.com/images/g/a1/s-l1600.jpg", 5_000)
        // Placeholder-sized, must be discarded
        .image("https://i.ebayimg.com/images/g/a2/s-l1600.webp", 200)
        .image("https://i.ebayimg.com/images/g/b1/s-l1600.jpg", 3_000)
        .image("https://i.ebayimg.com/images/g/c1/s-l1600.jpg", 4_000)
        .image("https://i.ebayimg.com/images/g/t5/s-l1600.jpg", 2_500)
}

fn pipeline(site: Arc<FakeSite>, images: Arc<FakeImages>, config: &Config) -> Pipeline {
    Pipeline::new(site, images, Arc::new(config.clone()))
}

/// Records every checkpoint so the sequence can be inspected.
#[derive(Default)]
struct Snapshots(Vec<Vec<ArtworkRecord>>);

impl Checkpoint for Snapshots {
    fn save(&mut self, records: &[ArtworkRecord]) -> Result<()> {
        self.0.push(records.to_vec());
        Ok(())
    }
}

/// Persists for real, then "crashes" after a number of saves.
struct CrashAfter {
    store: JsonStore,
    saves_left: usize,
}

impl Checkpoint for CrashAfter {
    fn save(&mut self, records: &[ArtworkRecord]) -> Result<()> {
        self.store.save(records)?;
        self.saves_left -= 1;
        if self.saves_left == 0 {
            return Err(anyhow!("simulated crash"));
        }
        Ok(())
    }
}

fn slugs(records: &[ArtworkRecord]) -> Vec<&str> {
    records.iter().map(|r| r.slug.as_str()).collect()
}

#[tokio::test]
async fn full_run_builds_deduplicated_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let site = Arc::new(site());
    let fetcher = Arc::new(images());
    let mut store = JsonStore::new(&config.paths.data_file);

    let summary = pipeline(site.clone(), fetcher.clone(), &config)
        .run(&mut store)
        .await
        .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            discovered: 6,
            extracted: 3,
            duplicates: 1,
            skipped: 2,
        }
    );

    let saved = store.load().unwrap();
    assert_eq!(slugs(&saved), vec!["red-sunset", "harbour-lights", "meadow"]);

    let sunset = &saved[0];
    assert_eq!(sunset.title, "Red Sunset");
    assert_eq!(sunset.price, "£45.00");
    assert_eq!(sunset.description, "Warm evening sky over the bay.");
    assert_eq!(sunset.specs.get("medium").map(String::as_str), Some("Acrylic"));
    assert_eq!(sunset.images, vec!["main.jpg".to_string()]);
    assert_eq!(sunset.ebay_url.as_deref(), Some("https://www.ebay.co.uk/itm/1"));
    // The later "Red Sunset ORIGINAL" listing was never fetched
    assert_eq!(site.open_count("https://www.ebay.co.uk/itm/3"), 0);
    assert!(!fetcher
        .requested()
        .contains(&"https://i.ebayimg.com/images/g/c1/s-l1600.jpg".to_string()));

    let harbour = &saved[1];
    assert_eq!(harbour.title, "Harbour Lights");
    assert_eq!(harbour.description, "Harbour at night.\nFramed in oak.");

    let meadow = &saved[2];
    assert_eq!(meadow.price, "$30.00");
    assert_eq!(meadow.images, vec!["main.jpg".to_string()]);
    assert!(fetcher
        .requested()
        .contains(&"https://i.ebayimg.com/images/g/t5/s-l1600.jpg".to_string()));

    // Profile was unreachable, so discovery fell back to the seller search
    assert_eq!(site.opened()[0], PROFILE_URL);
    assert_eq!(site.open_count(SEARCH_URL), 1);
    assert_eq!(site.open_count(PAGE_TWO), 1);
}

#[tokio::test]
async fn store_and_image_tree_stay_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let mut store = JsonStore::new(&config.paths.data_file);

    pipeline(Arc::new(site()), Arc::new(images()), &config)
        .run(&mut store)
        .await
        .unwrap();

    let saved = store.load().unwrap();
    for record in &saved {
        assert!(!record.images.is_empty(), "{} has no images", record.slug);
        for image in &record.images {
            let path = config.paths.images_dir.join(record.slug.as_str()).join(image);
            assert!(path.is_file(), "missing {}", path.display());
        }
    }

    let sunset_dir = config.paths.images_dir.join("red-sunset");
    assert!(!sunset_dir.join("detail-1.webp").exists());
    assert_eq!(fs::metadata(sunset_dir.join("main.jpg")).unwrap().len(), 5_000);

    // A listing that produced no images leaves no directory behind
    assert!(!config.paths.images_dir.join("empty-frame").exists());
    let mut dirs: Vec<String> = fs::read_dir(&config.paths.images_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    dirs.sort();
    assert_eq!(dirs, vec!["harbour-lights", "meadow", "red-sunset"]);
}

#[tokio::test]
async fn duplicate_listing_cannot_clobber_earlier_images() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let site = Arc::new(
        FakeSite::new()
            .page(
                SEARCH_URL,
                &results(
                    &[
                        card("NEW Red Sunset", "https://www.ebay.co.uk/itm/1", "£45.00", ""),
                        card("Red Sunset ORIGINAL", "https://www.ebay.co.uk/itm/3", "£45.00", ""),
                    ],
                    None,
                ),
            )
            .page(
                "https://www.ebay.co.uk/itm/1",
                r#"<img id="icImg" src="https://i.ebayimg.com/images/g/a1/s-l500.jpg">"#,
            )
            .page(
                "https://www.ebay.co.uk/itm/3",
                r#"<img id="icImg" src="https://i.ebayimg.com/images/g/c1/s-l500.jpg">"#,
            ),
    );
    let fetcher = Arc::new(
        FakeImages::new()
            .image("https://i.ebayimg.com/images/g/a1/s-l1600.jpg", 5_000)
            .image("https://i.ebayimg.com/images/g/c1/s-l1600.jpg", 200),
    );
    let mut store = JsonStore::new(&config.paths.data_file);

    let summary = pipeline(site.clone(), fetcher.clone(), &config)
        .run(&mut store)
        .await
        .unwrap();

    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.duplicates, 1);

    let saved = store.load().unwrap();
    assert_eq!(slugs(&saved), vec!["red-sunset"]);
    assert_eq!(saved[0].ebay_url.as_deref(), Some("https://www.ebay.co.uk/itm/1"));

    let cover = config.paths.images_dir.join("red-sunset").join("main.jpg");
    assert_eq!(fs::read(&cover).unwrap(), vec![0xAB; 5_000]);
    assert_eq!(site.open_count("https://www.ebay.co.uk/itm/3"), 0);
    assert_eq!(
        fetcher.requested(),
        vec!["https://i.ebayimg.com/images/g/a1/s-l1600.jpg".to_string()]
    );
}

#[tokio::test]
async fn failed_download_does_not_stop_later_images() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let site = FakeSite::new()
        .page(
            SEARCH_URL,
            &results(&[card("Poppies", "https://www.ebay.co.uk/itm/9", "£25.00", "")], None),
        )
        .page(
            "https://www.ebay.co.uk/itm/9",
            r#"
            <div class="ux-image-carousel-item"><img src="https://i.ebayimg.com/images/g/x/s-l500.jpg"></div>
            <div class="ux-image-carousel-item"><img src="https://i.ebayimg.com/images/g/y/s-l500.jpg"></div>
            "#,
        );
    // Only the second image exists; the first answers 404
    let fetcher = Arc::new(
        FakeImages::new().image("https://i.ebayimg.com/images/g/y/s-l1600.jpg", 3_000),
    );
    let mut store = JsonStore::new(&config.paths.data_file);

    pipeline(Arc::new(site), fetcher.clone(), &config)
        .run(&mut store)
        .await
        .unwrap();

    assert_eq!(fetcher.requested().len(), 2);
    let saved = store.load().unwrap();
    assert_eq!(slugs(&saved), vec!["poppies"]);
    assert_eq!(saved[0].images, vec!["detail-1.jpg".to_string()]);

    let poppies = config.paths.images_dir.join("poppies");
    assert!(poppies.join("detail-1.jpg").is_file());
    assert!(!poppies.join("main.jpg").exists());
}

#[tokio::test]
async fn every_checkpoint_is_deduplicated_and_growing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let mut snapshots = Snapshots::default();

    pipeline(Arc::new(site()), Arc::new(images()), &config)
        .run(&mut snapshots)
        .await
        .unwrap();

    let sizes: Vec<usize> = snapshots.0.iter().map(Vec::len).collect();
    // One save per success (3) plus the closing save
    assert_eq!(sizes, vec![1, 2, 3, 3]);

    for snapshot in &snapshots.0 {
        let unique: HashSet<_> = snapshot.iter().map(|r| r.slug.clone()).collect();
        assert_eq!(unique.len(), snapshot.len());
        assert!(snapshot.iter().all(|r| !r.images.is_empty()));
    }
}

#[tokio::test]
async fn interrupted_run_keeps_completed_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let mut crashing = CrashAfter {
        store: JsonStore::new(&config.paths.data_file),
        saves_left: 2,
    };

    let result = pipeline(Arc::new(site()), Arc::new(images()), &config)
        .run(&mut crashing)
        .await;
    assert!(result.is_err());

    let store = JsonStore::new(&config.paths.data_file);
    let after_crash = store.load().unwrap();
    assert_eq!(slugs(&after_crash), vec!["red-sunset", "harbour-lights"]);

    // A fresh run starts over and ends with the full set
    let mut store = store;
    pipeline(Arc::new(site()), Arc::new(images()), &config)
        .run(&mut store)
        .await
        .unwrap();

    let after_rerun = store.load().unwrap();
    assert_eq!(slugs(&after_rerun), vec!["red-sunset", "harbour-lights", "meadow"]);
    assert_eq!(&after_rerun[..2], &after_crash[..]);
}

#[tokio::test]
async fn no_listings_is_fatal_and_leaves_store_alone() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let site = FakeSite::new().page(SEARCH_URL, "<html><body><p>No results</p></body></html>");
    let mut snapshots = Snapshots::default();

    let err = pipeline(Arc::new(site), Arc::new(FakeImages::new()), &config)
        .run(&mut snapshots)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::NoListings(seller)) if seller == "jacquelineperryart"
    ));
    assert!(snapshots.0.is_empty());
}

#[tokio::test]
async fn all_stubs_failing_does_not_touch_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let site = FakeSite::new().page(
        SEARCH_URL,
        &results(&[card("Lost", "https://www.ebay.co.uk/itm/404", "£1.00", "")], None),
    );
    let mut snapshots = Snapshots::default();

    let summary = pipeline(Arc::new(site), Arc::new(FakeImages::new()), &config)
        .run(&mut snapshots)
        .await
        .unwrap();

    assert_eq!(summary.skipped, 1);
    assert!(snapshots.0.is_empty());
}

#[tokio::test]
async fn profile_link_is_preferred_over_search_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(dir.path()));
    let listing_url = "https://www.ebay.co.uk/sch/i.html?_ssn=jacquelineperryart&_sop=10";
    let site = Arc::new(
        FakeSite::new()
            .page(
                PROFILE_URL,
                r#"<a href="/help">Help</a>
                   <a href="/sch/i.html?_ssn=jacquelineperryart&_sop=10">See all 42 items</a>"#,
            )
            .page(
                listing_url,
                &results(&[card("Bluebells", "https://www.ebay.co.uk/itm/7", "£12.00", "")], None),
            ),
    );

    let stubs = ListingDiscoverer::new(site.clone(), config).discover().await;

    assert_eq!(stubs.len(), 1);
    assert_eq!(stubs[0].item_url, "https://www.ebay.co.uk/itm/7");
    assert_eq!(site.open_count(SEARCH_URL), 0);
}

#[tokio::test]
async fn discovery_waits_for_cards_to_render() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.timing.card_wait_short_ms = 2_000;
    let site = Arc::new(
        FakeSite::new()
            .page(SEARCH_URL, "<p>Loading...</p>")
            .page(SEARCH_URL, "<p>Still loading...</p>")
            .page(
                SEARCH_URL,
                &results(&[card("Tulips", "https://www.ebay.co.uk/itm/8", "£9.00", "")], None),
            ),
    );

    let stubs = ListingDiscoverer::new(site.clone(), Arc::new(config))
        .discover()
        .await;

    assert_eq!(stubs.len(), 1);
    assert_eq!(site.open_count(SEARCH_URL), 3);
}
