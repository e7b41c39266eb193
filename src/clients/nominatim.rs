//! Nominatim / OpenStreetMap geocoding client.
//!
//! The public Nominatim instance is free but strict: at most **1 request
//! per second** and an identifying User-Agent. Rate limiting is owned by
//! the geocoding service, not this client.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Coordinates;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("geocoding provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("geocoding provider rejected the request (rate limited)")]
    RateLimited,

    #[error("unexpected geocoding provider response: {message}")]
    Parse { message: String },
}

/// Network boundary for address lookup. Tests substitute a counting double
/// to verify coalescing and retry behaviour without touching the network.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Resolves a free-form address. `Ok(None)` means the provider had no
    /// match; that is terminal, unlike a transport error.
    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, ProviderError>;
}

pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    country_codes: String,
}

impl NominatimClient {
    #[must_use]
    pub const fn new(client: reqwest::Client, base_url: String, country_codes: String) -> Self {
        Self {
            client,
            base_url,
            country_codes,
        }
    }
}

#[async_trait]
impl GeocodeProvider for NominatimClient {
    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, ProviderError> {
        let mut query = vec![
            ("q", address),
            ("format", "jsonv2"),
            ("limit", "1"),
        ];
        if !self.country_codes.is_empty() {
            query.push(("countrycodes", &self.country_codes));
        }

        let resp = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_response(&body)
    }
}

/// Parses a Nominatim search response. Coordinates arrive as strings.
fn parse_response(body: &serde_json::Value) -> Result<Option<Coordinates>, ProviderError> {
    let results = body.as_array().ok_or_else(|| ProviderError::Parse {
        message: "response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| ProviderError::Parse {
            message: "missing lat in response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| ProviderError::Parse {
            message: "missing lon in response".to_string(),
        })?;

    Ok(Some(Coordinates::new(lat, lon)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "52.3731",
            "lon": "4.8922",
            "display_name": "Dam, Amsterdam, Noord-Holland, Nederland"
        }]);
        let coords = parse_response(&body).unwrap().unwrap();
        assert!((coords.latitude - 52.3731).abs() < 1e-4);
        assert!((coords.longitude - 4.8922).abs() < 1e-4);
    }

    #[test]
    fn parses_empty_result_as_no_match() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_non_array_response() {
        let body = serde_json::json!({"error": "boom"});
        assert!(parse_response(&body).is_err());
    }
}
