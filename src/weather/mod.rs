pub mod dto;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::WeatherConfig;
use crate::error::AppError;
use crate::models::{Condition, Location, WeatherReport};

/// Current-conditions lookup. Every failure is reported as
/// [`AppError::WeatherUnavailable`]; callers treat it as transient.
#[async_trait]
pub trait WeatherClient: Send + Sync {
    async fn current(&self, location: &Location) -> Result<WeatherReport, AppError>;
}

/// Query string accepted by `GET /api/weather`.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl WeatherQuery {
    pub fn into_location(self) -> Result<Location, AppError> {
        if let Some(city) = self.city.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
            return Ok(Location::City(city));
        }

        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(AppError::Validation(format!(
                        "coordinates out of range: lat={}, lon={}",
                        lat, lon
                    )));
                }
                Ok(Location::Coordinates { lat, lon })
            }
            (None, None) => Ok(Location::DEFAULT),
            _ => Err(AppError::Validation(
                "lat and lon must be given together".to_string(),
            )),
        }
    }
}

pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig, api_key: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                warn!("Failed to build http client: {}", e);
                AppError::InternalServerError
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub(crate) fn request_url(&self, location: &Location) -> Result<Url, AppError> {
        let mut params: Vec<(&str, String)> = match location {
            Location::City(city) => vec![("q", city.clone())],
            Location::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        };
        params.push(("units", "metric".to_string()));
        params.push(("appid", self.api_key.clone()));

        Url::parse_with_params(&format!("{}/weather", self.base_url), &params).map_err(|e| {
            warn!("invalid weather base url {}: {}", self.base_url, e);
            AppError::WeatherUnavailable
        })
    }
}

impl dto::CurrentWeatherResponse {
    fn into_report(self) -> Result<WeatherReport, AppError> {
        let entry = self.weather.into_iter().next().ok_or_else(|| {
            warn!("weather response has no conditions");
            AppError::WeatherUnavailable
        })?;

        Ok(WeatherReport {
            condition: Condition::from(entry.main),
            temperature_c: self.main.temp,
            humidity_pct: self.main.humidity,
            wind_speed_ms: self.wind.speed,
        })
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn current(&self, location: &Location) -> Result<WeatherReport, AppError> {
        let url = self.request_url(location)?;
        debug!(?location, "fetching weather data");

        let response = self.client.get(url).send().await.map_err(|e| {
            // reqwest includes the url (and so the api key) in its Display.
            let timeout = e.is_timeout();
            warn!(timeout, "weather request failed: {}", e.without_url());
            AppError::WeatherUnavailable
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "weather API error");
            return Err(AppError::WeatherUnavailable);
        }

        let body_text = response.text().await.map_err(|e| {
            warn!("failed to read weather response: {}", e.without_url());
            AppError::WeatherUnavailable
        })?;

        let parsed: dto::CurrentWeatherResponse =
            serde_json::from_str(&body_text).map_err(|e| {
                warn!("Failed to parse weather response: {}", e);
                AppError::WeatherUnavailable
            })?;

        let report = parsed.into_report()?;
        info!(?location, condition = ?report.condition, "weather data received");
        Ok(report)
    }
}

/// Stand-in used when no API key is configured.
pub struct UnconfiguredWeatherClient;

#[async_trait]
impl WeatherClient for UnconfiguredWeatherClient {
    async fn current(&self, location: &Location) -> Result<WeatherReport, AppError> {
        debug!(?location, "weather lookup skipped: no api key configured");
        Err(AppError::WeatherUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client() -> OpenWeatherClient {
        let config = WeatherConfig {
            api_key: Some("k3y".into()),
            base_url: "https://weather.example/data/2.5/".into(),
            timeout: Duration::from_secs(1),
        };
        OpenWeatherClient::new(&config, "k3y".into()).unwrap()
    }

    #[test]
    fn city_url_uses_q_param() {
        let url = client().request_url(&Location::City("São Paulo".into())).unwrap();

        assert_eq!(url.path(), "/data/2.5/weather");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".into(), "São Paulo".into())));
        assert!(pairs.contains(&("units".into(), "metric".into())));
        assert!(pairs.contains(&("appid".into(), "k3y".into())));
    }

    #[test]
    fn coordinate_url_uses_lat_lon() {
        let url = client().request_url(&Location::DEFAULT).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("lat".into(), "51.5074".into())));
        assert!(pairs.contains(&("lon".into(), "-0.1278".into())));
    }

    #[test]
    fn query_prefers_city_then_coordinates_then_default() {
        let city = WeatherQuery { city: Some(" London ".into()), lat: Some(1.0), lon: Some(2.0) };
        assert_eq!(city.into_location().unwrap(), Location::City("London".into()));

        let coords = WeatherQuery { city: Some("".into()), lat: Some(1.0), lon: Some(2.0) };
        assert_eq!(coords.into_location().unwrap(), Location::Coordinates { lat: 1.0, lon: 2.0 });

        assert_eq!(WeatherQuery::default().into_location().unwrap(), Location::DEFAULT);
    }

    #[test]
    fn query_rejects_half_or_out_of_range_coordinates() {
        let half = WeatherQuery { lat: Some(1.0), ..Default::default() };
        assert!(matches!(half.into_location(), Err(AppError::Validation(_))));

        let far = WeatherQuery { lat: Some(91.0), lon: Some(0.0), ..Default::default() };
        assert!(matches!(far.into_location(), Err(AppError::Validation(_))));
    }

    #[test]
    fn response_maps_to_report() {
        let parsed: dto::CurrentWeatherResponse = serde_json::from_str(
            r#"{"weather":[{"main":"Rain","description":"light rain"}],
                "main":{"temp":11.3,"humidity":87,"pressure":1012},
                "wind":{"speed":4.1,"deg":200},"name":"London"}"#,
        )
        .unwrap();
        let report = parsed.into_report().unwrap();

        assert_eq!(report.condition, Condition::Rain);
        assert_eq!(report.temperature_c, 11.3);
        assert_eq!(report.humidity_pct, 87.0);
        assert_eq!(report.wind_speed_ms, 4.1);
    }

    #[test]
    fn empty_conditions_are_unavailable() {
        let parsed: dto::CurrentWeatherResponse = serde_json::from_str(
            r#"{"weather":[],"main":{"temp":1,"humidity":2},"wind":{"speed":3}}"#,
        )
        .unwrap();
        assert!(matches!(parsed.into_report(), Err(AppError::WeatherUnavailable)));
    }

    #[tokio::test]
    async fn unconfigured_client_is_always_unavailable() {
        let err = UnconfiguredWeatherClient.current(&Location::DEFAULT).await.unwrap_err();
        assert!(matches!(err, AppError::WeatherUnavailable));
    }
}
