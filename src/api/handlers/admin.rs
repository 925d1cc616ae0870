//! Configuration management handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::domain::{
    ApiResponse, BulkFormatRequest, BulkFormatResponse, ResetRequest, SequenceConfig,
    StatisticsResponse, UpdateConfigRequest,
};
use crate::error::{AppError, Result};

/// Query parameters selecting one document type.
#[derive(Debug, Deserialize)]
pub struct DocumentTypeQuery {
    /// Document type.
    pub document_type: String,
}

impl DocumentTypeQuery {
    fn validate(&self) -> Result<()> {
        if self.document_type.is_empty() {
            return Err(AppError::BadRequest("document_type is required".to_string()));
        }
        Ok(())
    }
}

/// Get one document type's configuration.
///
/// # Errors
///
/// Returns an error if the configuration is not found.
pub async fn get_config(
    State(state): State<AppState>,
    Query(query): Query<DocumentTypeQuery>,
) -> Result<Json<ApiResponse<SequenceConfig>>> {
    query.validate()?;

    let config = state.admin_service.get_config(&query.document_type).await?;
    Ok(Json(ApiResponse::success(config)))
}

/// List all configurations.
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn list_configs(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SequenceConfig>>>> {
    let configs = state.admin_service.list_configs().await?;
    Ok(Json(ApiResponse::success(configs)))
}

/// Merge a partial update into one document type's configuration.
///
/// # Errors
///
/// Returns `InvalidFormat` when the merged configuration fails validation.
pub async fn update_config(
    State(state): State<AppState>,
    Json(request): Json<UpdateConfigRequest>,
) -> Result<Json<ApiResponse<SequenceConfig>>> {
    if request.document_type.is_empty() {
        return Err(AppError::BadRequest("document_type is required".to_string()));
    }

    let config = state
        .admin_service
        .update_config(&request.document_type, request.patch)
        .await?;

    Ok(Json(ApiResponse::success(config)))
}

/// Apply one format across every configured document type.
///
/// Partial failures are reported in the response without rolling back the
/// types that already succeeded.
///
/// # Errors
///
/// Returns an error if the configurations cannot be listed.
pub async fn bulk_update_format(
    State(state): State<AppState>,
    Json(request): Json<BulkFormatRequest>,
) -> Result<Json<ApiResponse<BulkFormatResponse>>> {
    let outcome = state.admin_service.bulk_update_format(request).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// Reset one document type's counter and used index.
///
/// Irreversible; the request must carry `confirm: true`.
///
/// # Errors
///
/// Returns `BadRequest` without confirmation, `ConfigNotFound` for
/// unconfigured types.
pub async fn reset_system(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<ApiResponse<()>>> {
    if request.document_type.is_empty() {
        return Err(AppError::BadRequest("document_type is required".to_string()));
    }
    if !request.confirm {
        return Err(AppError::BadRequest(
            "reset is irreversible; pass confirm=true".to_string(),
        ));
    }

    state.admin_service.reset_system(&request.document_type).await?;
    Ok(Json(ApiResponse::ok()))
}

/// Sequence statistics for one document type.
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn statistics(
    State(state): State<AppState>,
    Query(query): Query<DocumentTypeQuery>,
) -> Result<Json<ApiResponse<StatisticsResponse>>> {
    query.validate()?;

    let stats = state.admin_service.statistics(&query.document_type).await?;
    Ok(Json(ApiResponse::success(stats)))
}
