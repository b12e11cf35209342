use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
};
use partsdb_core::{Appliance, PartRecord, PartStore, PartType};
use partsdb_store::{ManualClock, MemorySnapshotStore, Refresher, ServingCache, StoreError};
use serde_json::Value;
use tower::ServiceExt;

use super::*;

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-10-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn record(part_number: &str, name: &str, part_type: PartType, appliance: Appliance) -> PartRecord {
    PartRecord {
        part_number: part_number.to_owned(),
        name: name.to_owned(),
        manufacturer_part_number: "WPW10321304".to_owned(),
        price: "$36.08".to_owned(),
        image: "https://via.placeholder.com/80".to_owned(),
        star_rating: "90%".to_owned(),
        number_of_reviews: 12,
        description: "No description available".to_owned(),
        part_type,
        appliance,
        part_url: format!("https://www.partselect.com/{part_number}.htm"),
    }
}

fn sample_store() -> PartStore {
    let mut store = PartStore::new();
    store.insert_first_seen(record(
        "PS11752778",
        "Refrigerator Water Filter",
        PartType::Filter,
        Appliance::Refrigerator,
    ));
    store.insert_first_seen(record(
        "PS3406971",
        "Dishwasher Drain Pump",
        PartType::DrainPump,
        Appliance::Dishwasher,
    ));
    store.set_support_phone("1-877-555-0142");
    store
}

struct StubRefresher {
    store: PartStore,
    fail: AtomicBool,
}

#[async_trait::async_trait]
impl Refresher for StubRefresher {
    async fn refresh(&self) -> Result<PartStore, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StoreError::UpstreamUnavailable("site down".to_owned()))
        } else {
            Ok(self.store.clone())
        }
    }
}

fn app_with(store: PartStore, fail: bool, snapshots: MemorySnapshotStore) -> (Router, AppState) {
    let cache = ServingCache::new(
        Arc::new(StubRefresher {
            store,
            fail: AtomicBool::new(fail),
        }),
        Arc::new(snapshots),
        Arc::new(ManualClock::new(t0())),
        Duration::from_secs(86_400),
    );
    let state = AppState {
        cache: Arc::new(cache),
    };
    (build_app(state.clone()), state)
}

fn healthy_app() -> Router {
    app_with(sample_store(), false, MemorySnapshotStore::new()).0
}

fn failing_app() -> Router {
    app_with(PartStore::new(), true, MemorySnapshotStore::new()).0
}

async fn send(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

// -----------------------------------------------------------------------
// /scrape-and-get-data
// -----------------------------------------------------------------------

#[tokio::test]
async fn scrape_and_get_data_returns_wire_form_with_snapshot_headers() {
    let response = send(healthy_app(), "/scrape-and-get-data").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "cache-control"), Some("no-store"));
    assert_eq!(
        header(&response, "x-snapshot-captured-at"),
        Some("2024-10-01T12:00:00Z")
    );
    assert_eq!(header(&response, "x-snapshot-stale"), Some("false"));
    assert!(header(&response, "x-request-id").is_some());

    let json = body_json(response).await;
    assert_eq!(json["Support Phone Number"], "1-877-555-0142");
    assert_eq!(json["PS11752778"]["partNumber"], "PS11752778");
    assert_eq!(json["PS11752778"]["partType"], "filter");
    assert_eq!(json["PS3406971"]["appliance"], "dishwasher");
}

#[tokio::test]
async fn scrape_and_get_data_serves_disk_snapshot_as_stale() {
    let saved_at = t0() - chrono::TimeDelta::days(2);
    let (app, _) = app_with(
        PartStore::new(),
        true,
        MemorySnapshotStore::with_snapshot(sample_store(), saved_at),
    );

    let response = send(app, "/scrape-and-get-data").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-snapshot-stale"), Some("true"));
    assert_eq!(
        header(&response, "x-snapshot-captured-at"),
        Some("2024-09-29T12:00:00Z")
    );
}

#[tokio::test]
async fn scrape_and_get_data_without_fallback_returns_500() {
    let response = send(failing_app(), "/scrape-and-get-data").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(
        json,
        serde_json::json!({ "error": "Failed to scrape or read part data" })
    );
}

// -----------------------------------------------------------------------
// /api/v1/parts
// -----------------------------------------------------------------------

#[tokio::test]
async fn list_parts_returns_all_with_snapshot_meta() {
    let response = send(healthy_app(), "/api/v1/parts").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["meta"]["stale"], false);
    assert_eq!(json["meta"]["captured_at"], "2024-10-01T12:00:00Z");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn list_parts_filters_by_tags() {
    let response = send(
        healthy_app(),
        "/api/v1/parts?part_type=drain%20pump&appliance=dishwasher",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["partNumber"], "PS3406971");
}

#[tokio::test]
async fn list_parts_rejects_unknown_tag() {
    let response = send(healthy_app(), "/api/v1/parts?appliance=toaster").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn list_parts_without_data_returns_503() {
    let response = send(failing_app(), "/api/v1/parts").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "unavailable");
}

#[tokio::test]
async fn get_part_uppercases_lookup_key() {
    let response = send(healthy_app(), "/api/v1/parts/ps3406971").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Dishwasher Drain Pump");
}

#[tokio::test]
async fn get_part_missing_returns_404() {
    let response = send(healthy_app(), "/api/v1/parts/PS0000000").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "not_found");
}

// -----------------------------------------------------------------------
// /api/v1/health
// -----------------------------------------------------------------------

#[tokio::test]
async fn health_is_degraded_before_any_data() {
    let response = send(healthy_app(), "/api/v1/health").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "degraded");
    assert_eq!(json["data"]["cache"], "empty");
}

#[tokio::test]
async fn health_is_ok_once_cache_holds_data() {
    let (app, state) = app_with(sample_store(), false, MemorySnapshotStore::new());
    state.cache.get().await.unwrap();

    let response = send(app, "/api/v1/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["cache"], "fresh");
}
