//! Split-by-size upload endpoint.

use std::fmt;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use futures::TryStreamExt;
use ms_core::{IngestError, StorageError};
use ms_pipeline::BodyError;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Name of the multipart field carrying the media file.
pub const FILE_FIELD: &str = "file";

/// Response envelope shared by every media endpoint.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    pub is_success: bool,
    pub data: T,
    pub errors: Vec<ApiErrorItem>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            is_success: true,
            data,
            errors: Vec::new(),
        }
    }
}

/// One entry of the `errors` array.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorItem {
    /// Machine-readable code such as `PROBE_ERROR`.
    pub code: String,
    pub msg: String,
}

/// Failure body; `data` is always an empty object.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub is_success: bool,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub errors: Vec<ApiErrorItem>,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SplitResponse {
    /// One URL per segment, in playback order.
    pub media_urls: Vec<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SplitQuery {
    /// Target chunk size in megabytes; defaults to the configured size.
    pub size: Option<i64>,
}

/// POST /api/v1/media/split-by-size
#[utoipa::path(
    post,
    path = "/api/v1/media/split-by-size",
    params(SplitQuery),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Media split into chunks", body = ApiResponse<SplitResponse>),
        (status = 400, description = "Invalid size or upload", body = ApiErrorResponse),
        (status = 413, description = "Upload exceeds the configured size limit", body = ApiErrorResponse),
        (status = 422, description = "Media could not be probed", body = ApiErrorResponse),
        (status = 502, description = "Segmentation failed", body = ApiErrorResponse),
    )
)]
pub async fn split_by_size(
    State(ctx): State<AppContext>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    query: Result<Query<SplitQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<SplitResponse>>, AppError> {
    let reject = |e: AppError| e.with_request_id(request_id.clone());

    let Query(query) = query.map_err(|e| reject(AppError::validation(e.body_text())))?;
    let mut multipart = multipart.map_err(|e| reject(AppError::validation(e.body_text())))?;
    let size = query
        .size
        .unwrap_or_else(|| i64::from(ctx.config.split.default_size_mb));

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| reject(multipart_error(e)))?;

        let Some(field) = field else {
            return Err(reject(AppError::validation(format!(
                "missing multipart field '{FILE_FIELD}'"
            ))));
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let media_urls = ctx
            .ingestor
            .split_by_size(&file_name, field.map_err(FieldError), size)
            .await
            .map_err(|e| reject(e.into()))?;

        return Ok(Json(ApiResponse::success(SplitResponse { media_urls })));
    }
}

/// A multipart read failure; over-limit bodies keep their 413.
fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IngestError::from(StorageError::TooLarge(e.body_text())).into()
    } else {
        AppError::validation(e.body_text())
    }
}

/// Error from the `file` field's byte stream.
struct FieldError(MultipartError);

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.body_text())
    }
}

impl BodyError for FieldError {
    fn exceeds_limit(&self) -> bool {
        self.0.status() == StatusCode::PAYLOAD_TOO_LARGE
    }
}
