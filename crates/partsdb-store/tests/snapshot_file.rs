use std::sync::Arc;
use std::time::Duration;

use partsdb_core::{Appliance, PartRecord, PartStore, PartType, ScraperSettings, SUPPORT_PHONE_KEY};
use partsdb_scraper::{FixedIdentityRotator, FixtureNavigator};
use partsdb_store::{
    JsonFileSnapshotStore, NavigatorRefresher, ServingCache, SnapshotStore, StoreError,
    SystemClock,
};

fn sample_store() -> PartStore {
    let mut store = PartStore::new();
    store.insert_first_seen(PartRecord {
        part_number: "PS11752778".to_owned(),
        name: "Refrigerator Door Shelf Bin".to_owned(),
        manufacturer_part_number: "WPW10321304".to_owned(),
        price: "$36.08".to_owned(),
        image: "https://www.partselect.com/assets/images/parts/PS11752778.jpg".to_owned(),
        star_rating: "90%".to_owned(),
        number_of_reviews: 12,
        description: "This refrigerator door bin is a genuine OEM replacement.".to_owned(),
        part_type: PartType::Unknown,
        appliance: Appliance::Refrigerator,
        part_url: "https://www.partselect.com/PS11752778.htm".to_owned(),
    });
    store.set_support_phone("1-877-555-0142");
    store
}

#[tokio::test]
async fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = JsonFileSnapshotStore::new(dir.path().join("partData.json"));
    let store = sample_store();

    snapshots.save(&store).await.unwrap();
    let loaded = snapshots.load().await.unwrap();

    assert_eq!(loaded.store, store);
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("partData.json")]);
}

#[tokio::test]
async fn saved_file_uses_flat_wire_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("partData.json");
    let snapshots = JsonFileSnapshotStore::new(&path);
    snapshots.save(&sample_store()).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json[SUPPORT_PHONE_KEY], "1-877-555-0142");
    assert_eq!(json["PS11752778"]["manufacturerPartNumber"], "WPW10321304");
    assert_eq!(json["PS11752778"]["starRating"], "90%");
}

#[tokio::test]
async fn save_replaces_previous_snapshot_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = JsonFileSnapshotStore::new(dir.path().join("partData.json"));
    snapshots.save(&sample_store()).await.unwrap();

    let mut other = PartStore::new();
    let mut record = sample_store().get("PS11752778").unwrap().clone();
    record.part_number = "PS3406971".to_owned();
    other.insert_first_seen(record);
    snapshots.save(&other).await.unwrap();

    let loaded = snapshots.load().await.unwrap();
    assert_eq!(loaded.store.len(), 1);
    assert!(loaded.store.get("PS11752778").is_none());
}

#[tokio::test]
async fn empty_store_is_never_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partData.json");
    let snapshots = JsonFileSnapshotStore::new(&path);
    snapshots.save(&sample_store()).await.unwrap();

    let mut empty = PartStore::new();
    empty.set_support_phone("1-888-738-4871");
    let result = snapshots.save(&empty).await;

    assert!(matches!(result, Err(StoreError::EmptySnapshot)), "got: {result:?}");
    assert_eq!(snapshots.load().await.unwrap().store, sample_store());
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = JsonFileSnapshotStore::new(dir.path().join("absent.json"));
    let result = snapshots.load().await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })), "got: {result:?}");
}

#[tokio::test]
async fn corrupt_file_is_a_deserialize_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partData.json");
    std::fs::write(&path, "{ \"PS1\": { \"partNumber\": ").unwrap();
    let result = JsonFileSnapshotStore::new(&path).load().await;
    assert!(matches!(result, Err(StoreError::Deserialize { .. })), "got: {result:?}");
}

#[tokio::test]
async fn pipeline_refresh_lands_on_disk_through_the_cache() {
    const ORIGIN: &str = "https://www.partselect.com";
    const URL: &str = "https://www.partselect.com/Freezer-Parts.htm";
    let page = r#"<html><body>
      <div class="nf__part"><div class="nf__part__detail">
        <a class="nf__part__detail__title" href="/PS12364199-Ice-Maker.htm"><span>Freezer Ice Maker Assembly</span></a>
        <div class="nf__part__detail__part-number">PartSelect Number <strong>PS12364199</strong></div>
      </div></div></body></html>"#;

    let navigator = FixtureNavigator::new()
        .with_html(ORIGIN, "<body>Call 1-866-555-0199</body>")
        .with_html(URL, page);
    let settings = ScraperSettings {
        source_urls: vec![URL.to_owned()],
        delay_min_ms: 0,
        delay_max_ms: 0,
        settle_delay_ms: 0,
        retry_backoff_base_ms: 0,
        ..ScraperSettings::default()
    };
    let refresher = NavigatorRefresher::new(
        Arc::new(navigator),
        Arc::new(FixedIdentityRotator::from_settings(&settings)),
        settings,
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partData.json");
    let cache = ServingCache::new(
        Arc::new(refresher),
        Arc::new(JsonFileSnapshotStore::new(&path)),
        Arc::new(SystemClock),
        Duration::from_secs(3600),
    );

    let read = cache.get().await.unwrap();
    assert!(!read.stale);
    let part = read.snapshot.get("PS12364199").unwrap();
    assert_eq!(part.part_type, PartType::IceMaker);
    assert_eq!(part.appliance, Appliance::Freezer);
    assert_eq!(read.snapshot.support_phone(), Some("1-866-555-0199"));

    let on_disk = JsonFileSnapshotStore::new(&path).load().await.unwrap();
    assert_eq!(on_disk.store, *read.snapshot);
}

#[tokio::test]
async fn pipeline_with_no_parts_is_upstream_unavailable() {
    let navigator = FixtureNavigator::new();
    let settings = ScraperSettings {
        source_urls: vec!["https://www.partselect.com/Freezer-Parts.htm".to_owned()],
        delay_min_ms: 0,
        delay_max_ms: 0,
        retry_backoff_base_ms: 0,
        nav_max_retries: 0,
        ..ScraperSettings::default()
    };
    let refresher = NavigatorRefresher::new(
        Arc::new(navigator),
        Arc::new(FixedIdentityRotator::from_settings(&settings)),
        settings,
    );

    let result = partsdb_store::Refresher::refresh(&refresher).await;
    assert!(
        matches!(result, Err(StoreError::UpstreamUnavailable(ref msg)) if msg.contains("navigation")),
        "got: {result:?}"
    );
}
