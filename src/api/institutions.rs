use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::models::{Institution, InstitutionType};

const MAX_PAGE_SIZE: usize = 500;

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

const fn default_limit() -> usize {
    50
}

pub async fn list_institutions(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Institution>>>, ApiError> {
    if page.limit == 0 || page.limit > MAX_PAGE_SIZE {
        return Err(ApiError::validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let all = state.shared.institutions.list_all().await;
    let page_items: Vec<Institution> = all
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .collect();
    Ok(Json(ApiResponse::success(page_items)))
}

pub async fn get_institution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Institution>>, ApiError> {
    let institution = state
        .shared
        .institutions
        .get_by_id(id)
        .await
        .ok_or_else(|| ApiError::institution_not_found(id))?;
    Ok(Json(ApiResponse::success(institution)))
}

/// Distinct city names, sorted, for populating filter dropdowns.
pub async fn list_cities(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<String>>> {
    let mut cities: Vec<String> = state
        .shared
        .institutions
        .list_all()
        .await
        .into_iter()
        .map(|i| i.city)
        .collect();
    cities.sort();
    cities.dedup();
    Json(ApiResponse::success(cities))
}

pub async fn list_types() -> Json<ApiResponse<Vec<&'static str>>> {
    let types = InstitutionType::all().map(InstitutionType::as_str).to_vec();
    Json(ApiResponse::success(types))
}
