use serde::{Deserialize, Serialize};

use crate::models::Institution;
use crate::services::RankedResult;
use crate::services::distance::format_distance;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// A ranked search hit: the institution plus its distance from the search
/// origin, both raw and formatted for display.
#[derive(Debug, Serialize)]
pub struct NearbyResultDto {
    #[serde(flatten)]
    pub institution: Institution,

    pub distance_km: f64,

    pub distance_display: String,
}

impl From<RankedResult> for NearbyResultDto {
    fn from(result: RankedResult) -> Self {
        // rank() never emits a result without a distance.
        let distance_km = result.distance_km.unwrap_or_default();
        Self {
            institution: result.institution,
            distance_km,
            distance_display: format_distance(distance_km),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateComparisonRequest {
    pub institution_ids: Vec<i64>,

    #[serde(default)]
    pub filters_applied: serde_json::Value,
}
