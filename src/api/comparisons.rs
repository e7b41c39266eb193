use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CreateComparisonRequest};
use crate::models::{ComparisonSnapshot, Institution};

pub async fn create_comparison(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateComparisonRequest>,
) -> Result<Json<ApiResponse<ComparisonSnapshot>>, ApiError> {
    let snapshot = state
        .shared
        .comparison_service
        .create(request.institution_ids, request.filters_applied)
        .await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn get_comparison(
    State(state): State<Arc<AppState>>,
    Path(share_id): Path<String>,
) -> Result<Json<ApiResponse<ComparisonSnapshot>>, ApiError> {
    let snapshot = state.shared.comparison_service.get(&share_id).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// The snapshot's institutions resolved to full records, in selection
/// order. Counts as a view like the plain snapshot read.
pub async fn get_comparison_institutions(
    State(state): State<Arc<AppState>>,
    Path(share_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Institution>>>, ApiError> {
    let snapshot = state.shared.comparison_service.get(&share_id).await?;

    let mut institutions = Vec::with_capacity(snapshot.institution_ids.len());
    for id in snapshot.institution_ids {
        // Ids were validated at creation; a record removed since then is
        // simply skipped rather than failing the whole view.
        if let Some(institution) = state.shared.institutions.get_by_id(id).await {
            institutions.push(institution);
        }
    }
    Ok(Json(ApiResponse::success(institutions)))
}
