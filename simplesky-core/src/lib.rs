//! Core library for `simplesky`.
//!
//! This crate defines:
//! - Location resolution (place name or coordinates, geocoding when needed)
//! - Time-machine specifier parsing
//! - Abstraction over weather providers and the forecast payload model
//! - The [`SimpleSky`] client with one accessor per forecast granularity
//! - Configuration & credentials handling
//!
//! It is used by `simplesky-cli`, but can also be embedded by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod geocode;
pub mod location;
pub mod model;
pub mod provider;
pub mod time_spec;

pub use client::SimpleSky;
pub use config::{Config, GeocodingConfig, ProviderConfig};
pub use error::{Result, SkyError};
pub use geocode::{Geocoder, GoogleGeocoder};
pub use location::LocationResolver;
pub use model::{
    Coordinate, Currently, DataBlock, DataPoint, Daily, Flags, Granularity, Hourly,
    LocationQuery, Metadata, Minutely, WeatherResponse,
};
pub use provider::{ForecastOptions, ForecastRequest, ProviderId, Units, WeatherProvider};
pub use time_spec::{TimeSpec, TimeSpecError};

/// Shorten an upstream error body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
