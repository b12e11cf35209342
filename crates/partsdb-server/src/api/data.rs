//! The legacy whole-store endpoint consumed by the chat frontend.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::SecondsFormat;
use serde_json::json;

use super::AppState;

pub(super) const CAPTURED_AT_HEADER: &str = "x-snapshot-captured-at";
pub(super) const STALE_HEADER: &str = "x-snapshot-stale";

/// Body kept byte-compatible with existing clients.
const FAILURE_MESSAGE: &str = "Failed to scrape or read part data";

pub(super) async fn scrape_and_get_data(State(state): State<AppState>) -> Response {
    let read = match state.cache.get().await {
        Ok(read) => read,
        Err(e) => {
            tracing::error!(error = %e, "scrape-and-get-data failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": FAILURE_MESSAGE })),
            )
                .into_response();
        }
    };

    let mut response = Json(read.snapshot.as_ref()).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Ok(value) =
        HeaderValue::from_str(&read.captured_at.to_rfc3339_opts(SecondsFormat::Secs, true))
    {
        headers.insert(CAPTURED_AT_HEADER, value);
    }
    headers.insert(
        STALE_HEADER,
        HeaderValue::from_static(if read.stale { "true" } else { "false" }),
    );
    response
}
