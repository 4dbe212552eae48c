use std::sync::Arc;

use crate::{
    Config,
    error::{Result, SkyError},
    geocode::{Geocoder, GoogleGeocoder},
    location::LocationResolver,
    model::{Currently, Daily, Hourly, LocationQuery, Minutely, WeatherResponse},
    provider::{
        ForecastRequest, ProviderId, WeatherProvider, darksky::DarkSkyProvider,
        default_provider_from_config,
    },
    time_spec::TimeSpec,
};

/// Geocode-then-forecast client.
///
/// Each accessor runs one independent pipeline: resolve the location, build
/// the forecast request, fetch, and project the payload. The client holds no
/// mutable state, so a single instance can serve concurrent calls.
#[derive(Debug)]
pub struct SimpleSky {
    resolver: LocationResolver,
    provider: Box<dyn WeatherProvider>,
}

impl SimpleSky {
    /// Google geocoding plus the Dark Sky forecast API.
    pub fn new(geocoding_key: impl Into<String>, weather_key: impl Into<String>) -> Self {
        Self::with_collaborators(
            Arc::new(GoogleGeocoder::new(geocoding_key.into())),
            Box::new(DarkSkyProvider::new(ProviderId::DarkSky, weather_key.into())),
        )
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let geocoding_key = config.geocoding_api_key().ok_or_else(|| {
            anyhow::anyhow!(
                "No geocoding API key configured.\n\
                 Hint: run `simplesky configure <provider>` or set SIMPLESKY_GEOCODING_KEY."
            )
        })?;

        Ok(Self::with_collaborators(
            Arc::new(GoogleGeocoder::new(geocoding_key.to_owned())),
            default_provider_from_config(config)?,
        ))
    }

    pub fn with_collaborators(
        geocoder: Arc<dyn Geocoder>,
        provider: Box<dyn WeatherProvider>,
    ) -> Self {
        Self { resolver: LocationResolver::new(geocoder), provider }
    }

    async fn fetch(&self, request: ForecastRequest) -> Result<WeatherResponse> {
        self.provider.forecast(&request).await.map_err(SkyError::fetch)
    }

    /// Everything the weather API returns for now.
    pub async fn get_full(&self, location: &LocationQuery) -> Result<WeatherResponse> {
        let coordinate = self.resolver.resolve(location).await?;
        self.fetch(ForecastRequest::now(coordinate)).await
    }

    pub async fn get_currently(&self, location: &LocationQuery) -> Result<Currently> {
        self.get_full(location).await?.into_currently()
    }

    /// Minute-by-minute forecast for the next hour.
    ///
    /// Fails with [`SkyError::UnsupportedLocation`] where the API has no
    /// minutely coverage.
    pub async fn get_minutely(&self, location: &LocationQuery) -> Result<Minutely> {
        self.get_full(location).await?.into_minutely()
    }

    /// Hour-by-hour forecast; `extend` asks the API for its longer horizon.
    pub async fn get_hourly(&self, location: &LocationQuery, extend: bool) -> Result<Hourly> {
        let coordinate = self.resolver.resolve(location).await?;
        let request = ForecastRequest { extend_hourly: extend, ..ForecastRequest::now(coordinate) };
        self.fetch(request).await?.into_hourly()
    }

    pub async fn get_daily(&self, location: &LocationQuery) -> Result<Daily> {
        self.get_full(location).await?.into_daily()
    }

    /// Full payload anchored at a past or future instant.
    pub async fn get_time_machine(
        &self,
        location: &LocationQuery,
        when: &TimeSpec,
    ) -> Result<WeatherResponse> {
        let coordinate = self.resolver.resolve(location).await?;
        let time = when.resolve_now()?;

        let request = ForecastRequest { time: Some(time), ..ForecastRequest::now(coordinate) };
        self.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::Coordinate, time_spec::TimeSpecError};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{Value, json};
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug)]
    struct FixedGeocoder {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, place: &str) -> anyhow::Result<Vec<Coordinate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match place {
                "Nowhere" => Ok(Vec::new()),
                _ => Ok(vec![Coordinate::new(40.7127753, -74.0059728).unwrap()]),
            }
        }
    }

    /// Mimics the upstream API: 49 hourly points (169 extended), 61 minutely
    /// points where covered, 8 daily points.
    #[derive(Debug, Default)]
    struct FakeProvider {
        requests: Arc<Mutex<Vec<ForecastRequest>>>,
        no_minutely: bool,
        fail: bool,
    }

    fn block(len: usize) -> Value {
        let data: Vec<Value> = (0..len).map(|i| json!({ "time": i })).collect();
        json!({ "data": data })
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn forecast(&self, request: &ForecastRequest) -> anyhow::Result<WeatherResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                anyhow::bail!("status 403 Forbidden: daily usage limit exceeded");
            }

            let hours = if request.extend_hourly { 169 } else { 49 };
            let mut payload = json!({
                "latitude": request.coordinate.latitude,
                "longitude": request.coordinate.longitude,
                "timezone": "America/New_York",
                "offset": -4,
                "currently": { "time": 0, "temperature": 61.2 },
                "minutely": block(61),
                "hourly": block(hours),
                "daily": block(8),
                "flags": { "units": "us" }
            });
            if self.no_minutely {
                payload.as_object_mut().unwrap().remove("minutely");
            }
            Ok(serde_json::from_value(payload)?)
        }
    }

    struct Harness {
        sky: SimpleSky,
        geocode_calls: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<ForecastRequest>>>,
    }

    fn harness(provider: FakeProvider) -> Harness {
        let geocode_calls = Arc::new(AtomicUsize::new(0));
        let requests = provider.requests.clone();
        let sky = SimpleSky::with_collaborators(
            Arc::new(FixedGeocoder { calls: geocode_calls.clone() }),
            Box::new(provider),
        );
        Harness { sky, geocode_calls, requests }
    }

    fn nyc() -> LocationQuery {
        LocationQuery::place("New York City")
    }

    #[tokio::test]
    async fn full_from_coordinates_keeps_every_key() {
        let h = harness(FakeProvider::default());
        let resp = h.sky.get_full(&LocationQuery::coordinates(30.2870213, -97.7418409)).await.unwrap();

        assert_eq!(resp.latitude, 30.2870213);
        assert_eq!(resp.longitude, -97.7418409);
        assert!(resp.currently.is_some() && resp.minutely.is_some() && resp.flags.is_some());
        assert_eq!(h.geocode_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn full_from_place_geocodes_once() {
        let h = harness(FakeProvider::default());
        let resp = h.sky.get_full(&nyc()).await.unwrap();

        assert_eq!(resp.latitude, 40.7127753);
        assert_eq!(h.geocode_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_input_never_touches_the_network() {
        let h = harness(FakeProvider::default());
        let bad = LocationQuery::new(None, Some(23.0), None);

        assert!(matches!(h.sky.get_full(&bad).await, Err(SkyError::InvalidInput)));
        assert!(matches!(h.sky.get_currently(&bad).await, Err(SkyError::InvalidInput)));
        assert!(matches!(h.sky.get_hourly(&bad, true).await, Err(SkyError::InvalidInput)));
        assert!(matches!(h.sky.get_minutely(&bad).await, Err(SkyError::InvalidInput)));
        assert!(matches!(h.sky.get_daily(&bad).await, Err(SkyError::InvalidInput)));
        assert!(matches!(
            h.sky.get_time_machine(&bad, &TimeSpec::Timestamp(0)).await,
            Err(SkyError::InvalidInput)
        ));

        assert_eq!(h.geocode_calls.load(Ordering::SeqCst), 0);
        assert!(h.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_place_is_a_resolution_error() {
        let h = harness(FakeProvider::default());
        let err = h.sky.get_daily(&LocationQuery::place("Nowhere")).await.unwrap_err();

        assert!(matches!(err, SkyError::Resolution { .. }));
        assert!(h.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn currently_projects_current_conditions() {
        let h = harness(FakeProvider::default());
        let c = h.sky.get_currently(&nyc()).await.unwrap();
        assert_eq!(c.currently.temperature, Some(61.2));
        assert_eq!(c.metadata.timezone, "America/New_York");
    }

    #[tokio::test]
    async fn hourly_default_and_extended_horizons() {
        let h = harness(FakeProvider::default());

        let hourly = h.sky.get_hourly(&LocationQuery::coordinates(35.0, 35.0), false).await.unwrap();
        assert_eq!(hourly.hourly.data.len(), 49);

        let extended = h.sky.get_hourly(&nyc(), true).await.unwrap();
        assert_eq!(extended.hourly.data.len(), 169);

        let requests = h.requests.lock().unwrap();
        assert!(!requests[0].extend_hourly);
        assert!(requests[1].extend_hourly);
        assert!(requests.iter().all(|r| r.time.is_none()));
    }

    #[tokio::test]
    async fn minutely_returns_sixty_one_points() {
        let h = harness(FakeProvider::default());
        let m = h.sky.get_minutely(&nyc()).await.unwrap();
        assert_eq!(m.minutely.data.len(), 61);
    }

    #[tokio::test]
    async fn minutely_without_coverage_is_unsupported() {
        let h = harness(FakeProvider { no_minutely: true, ..Default::default() });
        let err = h.sky.get_minutely(&LocationQuery::coordinates(30.0, 30.0)).await.unwrap_err();
        assert!(matches!(err, SkyError::UnsupportedLocation { .. }));
    }

    #[tokio::test]
    async fn daily_returns_eight_points() {
        let h = harness(FakeProvider::default());
        let d = h.sky.get_daily(&LocationQuery::coordinates(23.0, -23.0)).await.unwrap();
        assert_eq!(d.daily.data.len(), 8);
    }

    #[tokio::test]
    async fn time_machine_with_timestamp() {
        let h = harness(FakeProvider::default());
        let resp = h
            .sky
            .get_time_machine(&LocationQuery::place("Houston, Texas"), &TimeSpec::from(255_657_600))
            .await
            .unwrap();

        assert!(resp.currently.is_some() && resp.hourly.is_some() && resp.daily.is_some());
        let requests = h.requests.lock().unwrap();
        assert_eq!(requests[0].time.map(|t| t.timestamp()), Some(255_657_600));
    }

    #[tokio::test]
    async fn time_machine_with_relative_offsets() {
        let h = harness(FakeProvider::default());
        let spec: TimeSpec = "-4y -5M -3m".parse().unwrap();
        let before = Utc::now();

        h.sky.get_time_machine(&LocationQuery::coordinates(40.0, -74.0), &spec).await.unwrap();

        let sent = h.requests.lock().unwrap()[0].time.unwrap();
        let expected = spec.resolve(before).unwrap();
        assert!((sent - expected).num_seconds().abs() < 60, "{sent} vs {expected}");
    }

    #[tokio::test]
    async fn time_machine_rejects_bad_spec_before_fetching() {
        let h = harness(FakeProvider::default());
        let spec = TimeSpec::Relative(vec![crate::time_spec::Offset {
            amount: i64::MAX,
            unit: crate::time_spec::TimeUnit::Years,
        }]);

        let err = h.sky.get_time_machine(&nyc(), &spec).await.unwrap_err();
        assert!(matches!(err, SkyError::InvalidTimeSpec(TimeSpecError::OutOfRange(_))));
        assert!(h.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn time_machine_rejects_empty_offsets_before_fetching() {
        let h = harness(FakeProvider::default());
        let err = h
            .sky
            .get_time_machine(&LocationQuery::coordinates(40.0, -74.0), &TimeSpec::Relative(vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, SkyError::InvalidTimeSpec(TimeSpecError::Empty)), "got {err:?}");
        assert!(h.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_carries_message() {
        let h = harness(FakeProvider { fail: true, ..Default::default() });
        let err = h.sky.get_full(&nyc()).await.unwrap_err();

        match err {
            SkyError::WeatherFetch { message } => assert!(message.contains("usage limit")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
