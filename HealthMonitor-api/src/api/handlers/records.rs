use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use tracing::{info, instrument};

use health_monitor_domain::auth::CurrentUser;
use crate::api::error::{ApiError, ApiJson, ApiQuery};
use crate::api::state::AppState;
use crate::entities::common::PublicErrorResponse;
use crate::entities::record::{
    convert_to_domain_measurements, convert_to_public_page, convert_to_public_record,
    PublicCreateRecordRequest, PublicRecord, PublicRecordPage, RecordListParams, RecordTypeParams,
};

/// List the caller's records of one type, newest first
#[utoipa::path(
    get,
    path = "/api/v1/record",
    params(
        RecordListParams
    ),
    responses(
        (status = 200, description = "One page of records and the total number of matches", body = PublicRecordPage),
        (status = 400, description = "Invalid query parameters", body = PublicErrorResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error", body = PublicErrorResponse)
    ),
    security(
        ("bearer" = [])
    ),
    tag = "records"
)]
#[instrument(skip(state, current))]
pub async fn list_records(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiQuery(params): ApiQuery<RecordListParams>,
) -> Result<Json<PublicRecordPage>, ApiError> {
    let page = state.records
        .list_records(&current.scope(), params.rtype.into(), params.skip, params.limit)
        .await?;

    Ok(Json(convert_to_public_page(page)))
}

/// Submit a record for the caller's bound device
#[utoipa::path(
    post,
    path = "/api/v1/record",
    params(
        RecordTypeParams
    ),
    request_body = PublicCreateRecordRequest,
    responses(
        (status = 201, description = "Record stored", body = PublicRecord),
        (status = 400, description = "Invalid measurements or no device bound", body = PublicErrorResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error", body = PublicErrorResponse)
    ),
    security(
        ("bearer" = [])
    ),
    tag = "records"
)]
#[instrument(skip(state, current, request))]
pub async fn create_record(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiQuery(params): ApiQuery<RecordTypeParams>,
    ApiJson(request): ApiJson<PublicCreateRecordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.records
        .create_record(&current.scope(), params.rtype.into(), convert_to_domain_measurements(request))
        .await?;

    info!("Created {} record {}", record.record_type, record.id);
    Ok((StatusCode::CREATED, Json(convert_to_public_record(record))))
}
