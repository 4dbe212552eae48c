use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;

use crate::{WeatherResponse, truncate_body};

use super::{ForecastOptions, ForecastRequest, ProviderId, WeatherProvider};

/// Client for the Dark Sky forecast API and compatible services.
#[derive(Debug, Clone)]
pub struct DarkSkyProvider {
    id: ProviderId,
    api_key: String,
    base_url: String,
    options: ForecastOptions,
    http: Client,
}

impl DarkSkyProvider {
    pub fn new(id: ProviderId, api_key: String) -> Self {
        Self::with_base_url(id, api_key, id.base_url())
    }

    pub fn with_base_url(id: ProviderId, api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            id,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            options: ForecastOptions::default(),
            http: Client::new(),
        }
    }

    pub fn with_options(mut self, options: ForecastOptions) -> Self {
        self.options = options;
        self
    }

    fn forecast_url(&self, request: &ForecastRequest) -> String {
        let mut url = format!(
            "{}/forecast/{}/{}",
            self.base_url, self.api_key, request.coordinate
        );
        if let Some(time) = request.time {
            url.push_str(&format!(",{}", time.timestamp()));
        }
        url
    }

    fn query(&self, request: &ForecastRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![("units", self.options.units.as_str().to_string())];
        if let Some(lang) = &self.options.language {
            query.push(("lang", lang.clone()));
        }
        if request.extend_hourly {
            query.push(("extend", "hourly".to_string()));
        }
        query
    }
}

#[async_trait]
impl WeatherProvider for DarkSkyProvider {
    async fn forecast(&self, request: &ForecastRequest) -> Result<WeatherResponse> {
        tracing::debug!(
            provider = %self.id,
            coordinate = %request.coordinate,
            time = ?request.time,
            extend_hourly = request.extend_hourly,
            "requesting forecast"
        );

        let res = self
            .http
            .get(self.forecast_url(request))
            .query(&self.query(request))
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to send request to {}", self.id))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to read {} response body", self.id))?;

        if !status.is_success() {
            tracing::warn!(provider = %self.id, %status, "forecast request rejected");
            return Err(anyhow!(
                "{} forecast request failed with status {}: {}",
                self.id,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse {} forecast JSON", self.id))
    }
}
