use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{model::Coordinate, truncate_body};

use super::Geocoder;

const GOOGLE_MAPS_URL: &str = "https://maps.googleapis.com";

/// Google Maps Geocoding API client.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    api_key: String,
    base_url: String,
    http: Client,
}

impl GoogleGeocoder {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, GOOGLE_MAPS_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, place: &str) -> Result<Vec<Coordinate>> {
        let url = format!("{}/maps/api/geocode/json", self.base_url);
        tracing::debug!(place, "geocoding place name");

        let res = self
            .http
            .get(&url)
            .query(&[("address", place), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to send request to Google geocoding API")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read geocoding response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Geocoding request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: GeocodeResponse =
            serde_json::from_str(&body).context("Failed to parse geocoding JSON")?;

        match parsed.status.as_str() {
            "OK" => Ok(parsed
                .results
                .into_iter()
                .filter_map(|r| Coordinate::new(r.geometry.location.lat, r.geometry.location.lng))
                .collect()),
            "ZERO_RESULTS" => Ok(Vec::new()),
            other => {
                tracing::warn!(status = other, "geocoding API rejected the request");
                Err(anyhow!(
                    "Geocoding API returned {}: {}",
                    other,
                    parsed.error_message.as_deref().unwrap_or("no error message"),
                ))
            }
        }
    }
}
