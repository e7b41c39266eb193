use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub geocoding: GeocodingConfig,

    pub comparisons: ComparisonConfig,

    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// 0 lets tokio pick the default worker count.
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8420,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Nominatim-compatible search endpoint.
    pub provider_url: String,

    /// Nominatim's usage policy requires an identifying User-Agent.
    pub user_agent: String,

    pub request_timeout_seconds: u64,

    /// Minimum spacing between outbound provider calls. The public
    /// Nominatim instance allows at most one request per second.
    pub min_request_interval_ms: u64,

    /// How long a caller waits for a rate-limiter permit before giving up.
    pub rate_wait_timeout_ms: u64,

    /// Provider attempts per resolution, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff between attempts.
    pub retry_base_delay_ms: u64,

    /// Resolved addresses kept in memory before LRU eviction kicks in.
    pub cache_capacity: usize,

    /// Restrict lookups to these ISO country codes; empty disables.
    pub country_codes: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            provider_url: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: "SchoolScout/1.0".to_string(),
            request_timeout_seconds: 10,
            min_request_interval_ms: 1000,
            rate_wait_timeout_ms: 10_000,
            max_attempts: 3,
            retry_base_delay_ms: 250,
            cache_capacity: 10_000,
            country_codes: "nl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Snapshots expire this many days after creation.
    pub ttl_days: i64,

    pub share_id_length: usize,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            ttl_days: 30,
            share_id_length: 22,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON file seeding the in-memory institution store. Empty starts
    /// the service with no institutions (tests seed programmatically).
    pub institutions_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            institutions_path: String::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        if let Ok(path) = std::env::var("SCHOOLSCOUT_CONFIG") {
            paths.push(PathBuf::from(path));
        }

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("schoolscout").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.geocoding.max_attempts >= 1,
            "geocoding.max_attempts must be at least 1"
        );
        anyhow::ensure!(
            self.geocoding.cache_capacity >= 1,
            "geocoding.cache_capacity must be at least 1"
        );
        anyhow::ensure!(
            self.comparisons.ttl_days >= 1,
            "comparisons.ttl_days must be at least 1"
        );
        anyhow::ensure!(
            self.comparisons.share_id_length >= 8,
            "comparisons.share_id_length must be at least 8"
        );
        Ok(())
    }
}
