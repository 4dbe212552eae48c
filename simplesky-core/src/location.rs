use std::sync::Arc;

use crate::{
    error::{Result, SkyError},
    geocode::Geocoder,
    model::{Coordinate, LocationQuery},
};

/// Turns a [`LocationQuery`] into coordinates, geocoding only when it has to.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Makes at most one geocoding call, and none when the query carries
    /// valid coordinates or is unusable.
    pub async fn resolve(&self, query: &LocationQuery) -> Result<Coordinate> {
        if let Some(coordinate) = query.coordinate() {
            return Ok(coordinate);
        }

        let place = query
            .place
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(SkyError::InvalidInput)?;

        let resolution_error = |message: String| SkyError::Resolution {
            place: place.to_string(),
            message,
        };

        let candidates = self
            .geocoder
            .geocode(place)
            .await
            .map_err(|err| resolution_error(format!("{err:#}")))?;

        let coordinate = candidates
            .into_iter()
            .next()
            .ok_or_else(|| resolution_error("no matching places found".to_string()))?;

        tracing::debug!(place, %coordinate, "resolved place name");
        Ok(coordinate)
    }
}
