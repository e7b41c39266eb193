use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::distance::haversine_km;
use crate::services::transport::{self, TransportEstimate, TransportMode};

#[derive(Debug, Deserialize)]
pub struct TransportationQuery {
    pub from_address: String,

    /// Comma-separated mode list, e.g. `walking,cycling,public_transit`.
    /// Defaults to everything except the school bus.
    #[serde(default)]
    pub modes: Option<String>,
}

const DEFAULT_MODES: [TransportMode; 4] = [
    TransportMode::Walking,
    TransportMode::Cycling,
    TransportMode::PublicTransit,
    TransportMode::Driving,
];

fn parse_modes(raw: Option<&str>) -> Result<Vec<TransportMode>, ApiError> {
    match raw {
        None => Ok(DEFAULT_MODES.to_vec()),
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().map_err(ApiError::validation))
            .collect(),
    }
}

/// Travel-time estimates from an address to an institution, one entry per
/// requested mode in the requested order. If the origin cannot be
/// resolved the whole request fails; there are no partial results.
pub async fn get_transportation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<TransportationQuery>,
) -> Result<Json<ApiResponse<Vec<TransportEstimate>>>, ApiError> {
    let modes = parse_modes(query.modes.as_deref())?;
    if modes.is_empty() {
        return Err(ApiError::validation("at least one mode must be requested"));
    }

    let institution = state
        .shared
        .institutions
        .get_by_id(id)
        .await
        .ok_or_else(|| ApiError::institution_not_found(id))?;

    let Some(destination) = institution.coordinates else {
        return Err(ApiError::validation(format!(
            "Institution {id} has no location data"
        )));
    };

    let origin = state.shared.geocoding.resolve(&query.from_address).await?;
    let distance_km = haversine_km(origin, destination);

    let estimates = transport::estimate(distance_km, &modes, None, Utc::now());
    Ok(Json(ApiResponse::success(estimates)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mode_lists() {
        let modes = parse_modes(Some("walking, cycling,driving")).unwrap();
        assert_eq!(
            modes,
            vec![
                TransportMode::Walking,
                TransportMode::Cycling,
                TransportMode::Driving
            ]
        );
    }

    #[test]
    fn rejects_unknown_modes() {
        assert!(parse_modes(Some("walking,teleport")).is_err());
    }

    #[test]
    fn defaults_exclude_school_bus() {
        let modes = parse_modes(None).unwrap();
        assert!(!modes.contains(&TransportMode::SchoolBus));
        assert_eq!(modes.len(), 4);
    }
}
