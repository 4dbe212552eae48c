use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::provider::{ForecastOptions, ProviderId, Units};

pub const GEOCODING_KEY_ENV: &str = "SIMPLESKY_GEOCODING_KEY";
pub const WEATHER_KEY_ENV: &str = "SIMPLESKY_WEATHER_KEY";

/// Credentials for a single weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Credentials for the geocoding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "darksky" or "pirateweather".
    pub default_provider: Option<String>,

    /// Unit system requested from the weather API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<Units>,

    /// Language for text summaries, e.g. "en" or "de".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoding: Option<GeocodingConfig>,

    /// Example TOML:
    /// [providers.darksky]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow!(
                "No default provider configured.\n\
                 Hint: run `simplesky configure <provider>` (e.g. `simplesky configure darksky`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "simplesky", "simplesky")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key; the first configured provider becomes the default.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    pub fn set_geocoding_api_key(&mut self, api_key: String) {
        self.geocoding = Some(GeocodingConfig { api_key });
    }

    pub fn geocoding_api_key(&self) -> Option<&str> {
        self.geocoding.as_ref().map(|cfg| cfg.api_key.as_str())
    }

    pub fn forecast_options(&self) -> ForecastOptions {
        ForecastOptions { units: self.units.unwrap_or_default(), language: self.language.clone() }
    }

    /// Apply `SIMPLESKY_GEOCODING_KEY` / `SIMPLESKY_WEATHER_KEY` from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(std::env::var(GEOCODING_KEY_ENV).ok(), std::env::var(WEATHER_KEY_ENV).ok())
    }

    /// The weather key lands on the default provider, falling back to Dark Sky.
    fn with_overrides(mut self, geocoding_key: Option<String>, weather_key: Option<String>) -> Result<Self> {
        if let Some(key) = geocoding_key.filter(|k| !k.trim().is_empty()) {
            self.set_geocoding_api_key(key);
        }

        if let Some(key) = weather_key.filter(|k| !k.trim().is_empty()) {
            let id = match self.default_provider {
                Some(_) => self.default_provider_id()?,
                None => ProviderId::DarkSky,
            };
            self.upsert_provider_api_key(id, key);
        }

        Ok(self)
    }
}
