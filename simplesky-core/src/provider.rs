use crate::{
    Config, WeatherResponse,
    model::Coordinate,
    provider::darksky::DarkSkyProvider,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Debug};

pub mod darksky;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    DarkSky,
    PirateWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::DarkSky => "darksky",
            ProviderId::PirateWeather => "pirateweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::DarkSky, ProviderId::PirateWeather]
    }

    /// Both providers speak the same forecast wire format; only the host differs.
    pub fn base_url(&self) -> &'static str {
        match self {
            ProviderId::DarkSky => "https://api.darksky.net",
            ProviderId::PirateWeather => "https://api.pirateweather.net",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "darksky" => Ok(ProviderId::DarkSky),
            "pirateweather" => Ok(ProviderId::PirateWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: darksky, pirateweather."
            )),
        }
    }
}

/// Unit system for values in the forecast payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Auto,
    Us,
    Si,
    Ca,
    Uk2,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Auto => "auto",
            Units::Us => "us",
            Units::Si => "si",
            Units::Ca => "ca",
            Units::Uk2 => "uk2",
        }
    }
}

/// Query options that apply to every request a provider makes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastOptions {
    pub units: Units,
    pub language: Option<String>,
}

/// One forecast call: where, optionally when, and whether to widen the hourly horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub coordinate: Coordinate,
    pub time: Option<DateTime<Utc>>,
    pub extend_hourly: bool,
}

impl ForecastRequest {
    pub fn now(coordinate: Coordinate) -> Self {
        Self { coordinate, time: None, extend_hourly: false }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn forecast(&self, request: &ForecastRequest) -> anyhow::Result<WeatherResponse>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `simplesky configure {id}` and enter your API key."
        )
    })?;

    let provider =
        DarkSkyProvider::new(id, api_key.to_owned()).with_options(config.forecast_options());

    Ok(Box::new(provider))
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("DarkSky").unwrap(), ProviderId::DarkSky);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("openweather").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
        assert!(err.to_string().contains("darksky, pirateweather"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::DarkSky, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn default_provider_from_config_errors_when_not_set() {
        let cfg = Config::default();
        let err = default_provider_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No default provider configured"));
        assert!(msg.contains("Hint: run `simplesky configure"));
    }

    #[test]
    fn default_provider_from_config_works_when_set_and_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::PirateWeather, "KEY".to_string());

        let provider = default_provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
