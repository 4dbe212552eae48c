use thiserror::Error;

use crate::{model::Granularity, time_spec::TimeSpecError};

pub type Result<T, E = SkyError> = std::result::Result<T, E>;

/// Every way a weather lookup can fail.
#[derive(Debug, Error)]
pub enum SkyError {
    #[error("No usable location: pass a place name or a valid latitude/longitude pair")]
    InvalidInput,

    #[error("Could not resolve '{place}' to coordinates: {message}")]
    Resolution { place: String, message: String },

    #[error(transparent)]
    InvalidTimeSpec(#[from] TimeSpecError),

    #[error("Weather request failed: {message}")]
    WeatherFetch { message: String },

    #[error("{granularity} data is not available for this location")]
    UnsupportedLocation { granularity: Granularity },
}

impl SkyError {
    pub(crate) fn fetch(err: anyhow::Error) -> Self {
        SkyError::WeatherFetch { message: format!("{err:#}") }
    }
}
