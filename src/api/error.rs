use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{ComparisonError, GeocodeError, SearchError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    /// Origin address could not be located: unresolved, provider down, or
    /// rate-limited past the bounded wait. All surface the same way.
    GeocodeFailed(GeocodeError),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::GeocodeFailed(err) => write!(f, "Geocoding failed: {}", err),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::GeocodeFailed(err) => {
                // RateLimited is operationally distinct but presented to
                // the user like any other transient geocode failure.
                match err {
                    GeocodeError::RateLimited => {
                        tracing::warn!("Geocode rate limit hit on a user request");
                    }
                    GeocodeError::Provider(msg) => {
                        tracing::warn!("Geocoding provider failure: {}", msg);
                    }
                    GeocodeError::Unresolved(_) => {}
                }
                let status = match err {
                    GeocodeError::Unresolved(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, "Could not locate address".to_string())
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<GeocodeError> for ApiError {
    fn from(err: GeocodeError) -> Self {
        ApiError::GeocodeFailed(err)
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Geocode(e) => ApiError::GeocodeFailed(e),
            SearchError::InvalidRadius(_) => ApiError::ValidationError(err.to_string()),
        }
    }
}

impl From<ComparisonError> for ApiError {
    fn from(err: ComparisonError) -> Self {
        match err {
            ComparisonError::SnapshotNotFound => ApiError::NotFound(err.to_string()),
            ComparisonError::UnknownInstitution(id) => {
                ApiError::NotFound(format!("Institution {} not found", id))
            }
            ComparisonError::SelectionSize(_) | ComparisonError::DuplicateSelection => {
                ApiError::ValidationError(err.to_string())
            }
            ComparisonError::ShareIdExhausted => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn institution_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("Institution {} not found", id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }
}
