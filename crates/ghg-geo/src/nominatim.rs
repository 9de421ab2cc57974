//! Nominatim geocoding client
//!
//! Timed-out requests are retried after a pause; any other failure is
//! logged and treated as "not found".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use ghg_core::{GeocoderConfig, GhgError, Result};

use crate::{Coordinates, Geocoder};

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

/// Parse a `/search?format=json` response body, using the first hit
pub fn parse_search_response(body: &str) -> Result<Option<Coordinates>> {
    let results: Vec<SearchResult> = serde_json::from_str(body)
        .map_err(|e| GhgError::GeocodeError(format!("Failed to parse response: {e}")))?;

    let Some(first) = results.into_iter().next() else {
        return Ok(None);
    };

    let lat = first
        .lat
        .parse::<f64>()
        .map_err(|e| GhgError::GeocodeError(format!("Invalid latitude {:?}: {e}", first.lat)))?;
    let lon = first
        .lon
        .parse::<f64>()
        .map_err(|e| GhgError::GeocodeError(format!("Invalid longitude {:?}: {e}", first.lon)))?;

    Ok(Some(Coordinates::new(lat, lon)))
}

enum LookupError {
    Timeout,
    Other(String),
}

/// OpenStreetMap Nominatim client
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    retries: u32,
    retry_delay: Duration,
}

impl NominatimGeocoder {
    /// Create from config
    pub fn from_config(config: &GeocoderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GhgError::GeocodeError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retries: config.retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn lookup(&self, place: &str) -> std::result::Result<Option<Coordinates>, LookupError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else {
                    LookupError::Other(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(LookupError::Other(format!(
                "Nominatim returned {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout
            } else {
                LookupError::Other(e.to_string())
            }
        })?;

        parse_search_response(&body).map_err(|e| LookupError::Other(e.to_string()))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<Coordinates>> {
        for attempt in 1..=self.retries {
            match self.lookup(place).await {
                Ok(coordinates) => return Ok(coordinates),
                Err(LookupError::Timeout) => {
                    tracing::warn!(
                        "Geocoding timed out for {} (attempt {}/{}), retrying",
                        place,
                        attempt,
                        self.retries
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(LookupError::Other(message)) => {
                    tracing::warn!("Geocoding failed for {}: {}", place, message);
                    return Ok(None);
                }
            }
        }

        tracing::warn!("Failed to geocode {} after {} retries", place, self.retries);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_hit() {
        let body = r#"[
            {"lat": "19.0759899", "lon": "72.8773928", "display_name": "Mumbai"},
            {"lat": "0", "lon": "0"}
        ]"#;
        let coordinates = parse_search_response(body).unwrap().unwrap();
        assert!((coordinates.lat - 19.0759899).abs() < 1e-9);
        assert!((coordinates.lon - 72.8773928).abs() < 1e-9);
    }

    #[test]
    fn test_parse_no_hits() {
        assert_eq!(parse_search_response("[]").unwrap(), None);
    }

    #[test]
    fn test_parse_bad_coordinates() {
        let err = parse_search_response(r#"[{"lat": "north", "lon": "1"}]"#).unwrap_err();
        assert!(matches!(err, GhgError::GeocodeError(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_not_found() {
        let config = GeocoderConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            retry_delay_ms: 0,
            ..Default::default()
        };
        let geocoder = NominatimGeocoder::from_config(&config).unwrap();
        assert_eq!(geocoder.geocode("Mumbai").await.unwrap(), None);
    }
}
