use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

mod comparisons;
mod error;
mod institutions;
mod search;
mod system;
mod transportation;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,
}

pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.shared.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/institutions", get(institutions::list_institutions))
        .route("/institutions/{id}", get(institutions::get_institution))
        .route("/cities", get(institutions::list_cities))
        .route("/types", get(institutions::list_types))
        .route("/search", get(search::search))
        .route("/search/nearby", get(search::search_nearby))
        .route("/search/special-needs", get(search::search_special_needs))
        .route(
            "/transportation/{id}",
            get(transportation::get_transportation),
        )
        .route("/comparisons", post(comparisons::create_comparison))
        .route("/comparisons/{share_id}", get(comparisons::get_comparison))
        .route(
            "/comparisons/{share_id}/institutions",
            get(comparisons::get_comparison_institutions),
        )
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/health", get(system::health))
        .with_state(state)
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
