use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, NearbyResultDto};
use crate::models::Institution;
use crate::services::{Filters, SupportNeeds};

const MAX_PAGE_SIZE: usize = 500;

/// Filter parameters shared by the search endpoints. The institution type
/// arrives as a string so a bad value yields a 400 instead of a
/// deserialize rejection.
#[derive(Debug, Default)]
pub struct FilterQuery {
    pub institution_type: Option<String>,
    pub city: Option<String>,
    pub name: Option<String>,
    pub min_rating: Option<f64>,
    pub bilingual: Option<bool>,
    pub international: Option<bool>,
    pub offers_english: Option<bool>,
}

impl FilterQuery {
    fn into_filters(self) -> Result<Filters, ApiError> {
        let institution_type = self
            .institution_type
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(ApiError::validation)?;

        if let Some(rating) = self.min_rating
            && !(0.0..=10.0).contains(&rating)
        {
            return Err(ApiError::validation("min_rating must be between 0 and 10"));
        }

        Ok(Filters {
            institution_type,
            city: self.city,
            name: self.name,
            min_rating: self.min_rating,
            bilingual: self.bilingual,
            international: self.international,
            offers_english: self.offers_english,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub institution_type: Option<String>,
    pub city: Option<String>,
    pub name: Option<String>,
    pub min_rating: Option<f64>,
    pub bilingual: Option<bool>,
    pub international: Option<bool>,
    pub offers_english: Option<bool>,

    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Institution>>>, ApiError> {
    let limit = query.limit.unwrap_or(MAX_PAGE_SIZE);
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ApiError::validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let offset = query.offset.unwrap_or(0);

    let filters = FilterQuery {
        institution_type: query.institution_type,
        city: query.city,
        name: query.name,
        min_rating: query.min_rating,
        bilingual: query.bilingual,
        international: query.international,
        offers_english: query.offers_english,
    }
    .into_filters()?;

    let results: Vec<Institution> = state
        .shared
        .search_service
        .search(&filters)
        .await
        .into_iter()
        .skip(offset)
        .take(limit)
        .collect();
    Ok(Json(ApiResponse::success(results)))
}

/// Filter fields are repeated here instead of `#[serde(flatten)]`:
/// query-string deserialization buffers flattened fields as strings, which
/// breaks the boolean and numeric filters.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub address: String,
    pub radius_km: f64,

    #[serde(default)]
    pub institution_type: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub bilingual: Option<bool>,
    #[serde(default)]
    pub international: Option<bool>,
    #[serde(default)]
    pub offers_english: Option<bool>,
}

pub async fn search_nearby(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ApiResponse<Vec<NearbyResultDto>>>, ApiError> {
    let filters = FilterQuery {
        institution_type: query.institution_type,
        city: query.city,
        name: query.name,
        min_rating: query.min_rating,
        bilingual: query.bilingual,
        international: query.international,
        offers_english: query.offers_english,
    }
    .into_filters()?;

    let ranked = state
        .shared
        .search_service
        .search_nearby(&query.address, query.radius_km, &filters)
        .await?;

    let results: Vec<NearbyResultDto> = ranked.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(results)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SpecialNeedsQuery {
    pub dyslexia: bool,
    pub adhd: bool,
    pub autism: bool,
    pub gifted: bool,
    pub wheelchair_accessible: bool,
    pub speech_therapy: bool,
    pub city: Option<String>,
}

/// OR-composed accessibility search: any requested kind of support
/// qualifies a school.
pub async fn search_special_needs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SpecialNeedsQuery>,
) -> Result<Json<ApiResponse<Vec<Institution>>>, ApiError> {
    let needs = SupportNeeds {
        dyslexia: query.dyslexia,
        adhd: query.adhd,
        autism: query.autism,
        gifted: query.gifted,
        wheelchair_accessible: query.wheelchair_accessible,
        speech_therapy: query.speech_therapy,
    };

    if !needs.any_requested() {
        return Err(ApiError::validation(
            "at least one support flag must be requested",
        ));
    }

    let results = state
        .shared
        .search_service
        .search_special_needs(needs, query.city.as_deref())
        .await;
    Ok(Json(ApiResponse::success(results)))
}
