use std::path::Path;
use std::sync::Arc;

use crate::clients::NominatimClient;
use crate::config::Config;
use crate::services::{ComparisonService, GeocodingService, SearchService};
use crate::store::{InMemoryInstitutionStore, InMemorySnapshotStore, InstitutionStore, SnapshotStore};

/// Build a shared HTTP client with reasonable defaults for provider
/// calls. Reused across the process to enable connection pooling.
fn build_shared_http_client(
    timeout_seconds: u64,
    user_agent: &str,
) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(user_agent)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Everything request handlers need, constructed once at process start and
/// passed by reference. No ambient singletons: tests build a fresh
/// `SharedState` (with store and provider doubles) per case.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub institutions: Arc<dyn InstitutionStore>,

    pub geocoding: Arc<GeocodingService>,

    pub search_service: Arc<SearchService>,

    pub comparison_service: Arc<ComparisonService>,
}

impl SharedState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let institutions: Arc<dyn InstitutionStore> =
            if config.data.institutions_path.is_empty() {
                Arc::new(InMemoryInstitutionStore::empty())
            } else {
                Arc::new(InMemoryInstitutionStore::from_seed_file(Path::new(
                    &config.data.institutions_path,
                ))?)
            };

        let http_client = build_shared_http_client(
            config.geocoding.request_timeout_seconds,
            &config.geocoding.user_agent,
        )?;
        let provider = Arc::new(NominatimClient::new(
            http_client,
            config.geocoding.provider_url.clone(),
            config.geocoding.country_codes.clone(),
        ));

        Self::with_stores(config, institutions, Arc::new(InMemorySnapshotStore::new()), provider)
    }

    /// Wiring seam for tests: substitute stores or the geocode provider.
    pub fn with_stores(
        config: Config,
        institutions: Arc<dyn InstitutionStore>,
        snapshots: Arc<dyn SnapshotStore>,
        provider: Arc<dyn crate::clients::GeocodeProvider>,
    ) -> anyhow::Result<Self> {
        let geocoding = Arc::new(GeocodingService::new(provider, &config.geocoding));

        let search_service = Arc::new(SearchService::new(institutions.clone(), geocoding.clone()));

        let comparison_service = Arc::new(ComparisonService::new(
            institutions.clone(),
            snapshots,
            config.comparisons.ttl_days,
            config.comparisons.share_id_length,
        ));

        Ok(Self {
            config: Arc::new(config),
            institutions,
            geocoding,
            search_service,
            comparison_service,
        })
    }
}
