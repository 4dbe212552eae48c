use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SkyError};

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Returns `None` unless both values are finite and within geographic range.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self { latitude, longitude })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// What the caller knows about the location: a place name, coordinates, or both.
///
/// Valid coordinates win over the place name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationQuery {
    pub place: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationQuery {
    pub fn new(place: Option<String>, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self { place, latitude, longitude }
    }

    pub fn place(name: impl Into<String>) -> Self {
        Self { place: Some(name.into()), ..Self::default() }
    }

    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        Self { place: None, latitude: Some(latitude), longitude: Some(longitude) }
    }

    /// The explicit coordinate pair, if both halves are present and valid.
    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::new(self.latitude?, self.longitude?)
    }
}

/// A single time-bucketed weather record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Every other field the upstream sent, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub data: Vec<DataPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The full forecast payload as returned by the weather API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currently: Option<DataPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutely: Option<DataBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly: Option<DataBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<DataBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Flags>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Currently,
    Minutely,
    Hourly,
    Daily,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Currently => "currently",
            Granularity::Minutely => "minutely",
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location metadata kept on every projected response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currently {
    #[serde(flatten)]
    pub metadata: Metadata,
    pub currently: DataPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minutely {
    #[serde(flatten)]
    pub metadata: Metadata,
    pub minutely: DataBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hourly {
    #[serde(flatten)]
    pub metadata: Metadata,
    pub hourly: DataBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Daily {
    #[serde(flatten)]
    pub metadata: Metadata,
    pub daily: DataBlock,
}

impl WeatherResponse {
    fn split<T>(
        mut self,
        granularity: Granularity,
        pick: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Result<(Metadata, T)> {
        let payload = pick(&mut self).ok_or(SkyError::UnsupportedLocation { granularity })?;
        let metadata = Metadata {
            latitude: self.latitude,
            longitude: self.longitude,
            timezone: self.timezone,
            offset: self.offset,
        };
        Ok((metadata, payload))
    }

    pub fn into_currently(self) -> Result<Currently> {
        let (metadata, currently) = self.split(Granularity::Currently, |r| r.currently.take())?;
        Ok(Currently { metadata, currently })
    }

    /// Fails with [`SkyError::UnsupportedLocation`] when the API has no
    /// minute-by-minute coverage here, which shows up as a missing or empty block.
    pub fn into_minutely(self) -> Result<Minutely> {
        let (metadata, minutely) = self.split(Granularity::Minutely, |r| {
            r.minutely.take().filter(|block| !block.data.is_empty())
        })?;
        Ok(Minutely { metadata, minutely })
    }

    pub fn into_hourly(self) -> Result<Hourly> {
        let (metadata, hourly) = self.split(Granularity::Hourly, |r| r.hourly.take())?;
        Ok(Hourly { metadata, hourly })
    }

    pub fn into_daily(self) -> Result<Daily> {
        let (metadata, daily) = self.split(Granularity::Daily, |r| r.daily.take())?;
        Ok(Daily { metadata, daily })
    }
}
