//! Search composition: geocoding, ranking and filtering glued together.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::distance::{self, RankedResult};
use super::filters::{Filters, SupportNeeds};
use super::geocoding::{GeocodeError, GeocodingService};
use crate::models::Institution;
use crate::store::InstitutionStore;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Geocode(#[from] GeocodeError),

    #[error("radius_km must be greater than zero, got {0}")]
    InvalidRadius(f64),
}

pub struct SearchService {
    store: Arc<dyn InstitutionStore>,
    geocoding: Arc<GeocodingService>,
}

impl SearchService {
    #[must_use]
    pub fn new(store: Arc<dyn InstitutionStore>, geocoding: Arc<GeocodingService>) -> Self {
        Self { store, geocoding }
    }

    /// Filtered list without any distance information.
    pub async fn search(&self, filters: &Filters) -> Vec<Institution> {
        let candidates = self.store.list_all().await;
        filters.apply(candidates)
    }

    /// Resolves the origin address, then ranks by distance within the
    /// radius and applies the remaining filters. The radius is validated
    /// before the geocode call goes out.
    pub async fn search_nearby(
        &self,
        address: &str,
        radius_km: f64,
        filters: &Filters,
    ) -> Result<Vec<RankedResult>, SearchError> {
        if radius_km <= 0.0 || !radius_km.is_finite() {
            return Err(SearchError::InvalidRadius(radius_km));
        }

        let origin = self.geocoding.resolve(address).await?;

        let candidates = self.store.list_all().await;
        let filtered = filters.apply(candidates);
        let ranked = distance::rank(origin, filtered, radius_km);

        debug!(
            "Nearby search around '{address}' ({radius_km} km): {} results",
            ranked.len()
        );
        Ok(ranked)
    }

    /// Special-needs search: OR across the requested support flags (any
    /// match qualifies), optionally narrowed by city with the usual AND.
    pub async fn search_special_needs(
        &self,
        needs: SupportNeeds,
        city: Option<&str>,
    ) -> Vec<Institution> {
        let city_filter = Filters {
            city: city.map(str::to_string),
            ..Filters::default()
        };

        let mut results = Vec::new();
        for institution in self.store.list_all().await {
            if !city_filter.matches(&institution) {
                continue;
            }
            let Some(profile) = self.store.support_profile(institution.id).await else {
                continue;
            };
            if needs.matches(&profile) {
                results.push(institution);
            }
        }
        results
    }
}
