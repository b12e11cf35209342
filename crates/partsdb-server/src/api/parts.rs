use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use partsdb_core::{Appliance, PartRecord, PartType};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_cache_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct PartQuery {
    pub part_type: Option<String>,
    pub appliance: Option<String>,
}

fn parse_tag<T: std::str::FromStr>(
    request_id: &str,
    field: &str,
    value: Option<&str>,
) -> Result<Option<T>, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<T>().map_err(|_| {
                ApiError::new(
                    request_id,
                    "validation_error",
                    format!("unknown {field}: {v}"),
                )
            })
        })
        .transpose()
}

pub(super) async fn list_parts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PartQuery>,
) -> Result<Json<ApiResponse<Vec<PartRecord>>>, ApiError> {
    let part_type: Option<PartType> =
        parse_tag(&req_id.0, "part_type", query.part_type.as_deref())?;
    let appliance: Option<Appliance> =
        parse_tag(&req_id.0, "appliance", query.appliance.as_deref())?;

    let read = state
        .cache
        .get()
        .await
        .map_err(|e| map_cache_error(req_id.0.clone(), &e))?;

    let data = read
        .snapshot
        .filter(part_type, appliance)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::with_snapshot(req_id.0, &read),
    }))
}

pub(super) async fn get_part(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(part_number): Path<String>,
) -> Result<Json<ApiResponse<PartRecord>>, ApiError> {
    let read = state
        .cache
        .get()
        .await
        .map_err(|e| map_cache_error(req_id.0.clone(), &e))?;

    let Some(record) = read.snapshot.get(&part_number).cloned() else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("part {} not found", part_number.trim().to_uppercase()),
        ));
    };

    Ok(Json(ApiResponse {
        data: record,
        meta: ResponseMeta::with_snapshot(req_id.0, &read),
    }))
}
