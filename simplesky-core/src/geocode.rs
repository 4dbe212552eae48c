use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::Coordinate;

pub mod google;

pub use google::GoogleGeocoder;

/// Turns a free-text place name into candidate coordinates, best match first.
///
/// An unknown place is an empty list, not an error.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode(&self, place: &str) -> anyhow::Result<Vec<Coordinate>>;
}
