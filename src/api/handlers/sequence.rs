//! Sequence allocation handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::domain::{
    ApiResponse, IdentifierRequest, IdentifierResponse, PreviewResponse, ReleaseResponse,
};
use crate::error::{AppError, Result};

/// Query parameters for allocation.
#[derive(Debug, Deserialize)]
pub struct AllocateQuery {
    /// Document type to allocate for.
    pub document_type: String,
}

/// Query parameters for preview.
#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    /// Document type to preview.
    pub document_type: String,

    /// Number of candidates to render (default: 5).
    #[serde(default = "default_preview_count")]
    pub count: u32,
}

const fn default_preview_count() -> u32 {
    5
}

/// Allocate the next identifier for a document type.
///
/// # Errors
///
/// Returns an error if the config is inactive, the retry bound is hit, or
/// storage fails.
pub async fn next_identifier(
    State(state): State<AppState>,
    Query(query): Query<AllocateQuery>,
) -> Result<Json<ApiResponse<IdentifierResponse>>> {
    if query.document_type.is_empty() {
        return Err(AppError::BadRequest("document_type is required".to_string()));
    }

    let identifier = state.allocator.allocate(&query.document_type).await?;

    Ok(Json(ApiResponse::success(IdentifierResponse {
        document_type: query.document_type,
        identifier,
    })))
}

/// Reserve an identifier out of band.
///
/// # Errors
///
/// Returns `AlreadyUsed` on conflict or `BadRequest` for shape mismatches.
pub async fn reserve(
    State(state): State<AppState>,
    Json(request): Json<IdentifierRequest>,
) -> Result<Json<ApiResponse<()>>> {
    request.validate().map_err(AppError::BadRequest)?;

    state
        .allocator
        .reserve(&request.document_type, &request.identifier)
        .await?;

    Ok(Json(ApiResponse::ok()))
}

/// Release a previously issued or reserved identifier.
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn release(
    State(state): State<AppState>,
    Json(request): Json<IdentifierRequest>,
) -> Result<Json<ApiResponse<ReleaseResponse>>> {
    request.validate().map_err(AppError::BadRequest)?;

    let released = state
        .allocator
        .release(&request.document_type, &request.identifier)
        .await?;

    Ok(Json(ApiResponse::success(ReleaseResponse { released })))
}

/// Preview the next candidates without mutating anything.
///
/// # Errors
///
/// Returns an error if the query is invalid or storage fails.
pub async fn preview(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<ApiResponse<PreviewResponse>>> {
    if query.document_type.is_empty() {
        return Err(AppError::BadRequest("document_type is required".to_string()));
    }
    if query.count == 0 {
        return Err(AppError::BadRequest("count must be at least 1".to_string()));
    }
    let limit = state.config.allocator.preview_limit;
    if query.count > limit {
        return Err(AppError::BadRequest(format!("count cannot exceed {limit}")));
    }

    let candidates = state
        .allocator
        .preview_next(&query.document_type, query.count)
        .await?;

    Ok(Json(ApiResponse::success(PreviewResponse {
        document_type: query.document_type,
        candidates,
    })))
}
