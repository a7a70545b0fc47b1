//! Current conditions from the OpenWeatherMap API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use super::config::WeatherConfig;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather service is not configured: WEATHER_API_KEY is not set")]
    NotConfigured,
    #[error("no weather data for location '{0}'")]
    LocationNotFound(String),
    #[error("weather API rejected the API key")]
    InvalidApiKey,
    #[error("weather API returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected weather payload: {0}")]
    Serde(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct WeatherData {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// km/h.
    pub wind_speed: f64,
    /// Rain over the last hour, mm.
    pub precipitation: f64,
    pub forecast: String,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    #[serde(default)]
    weather: Vec<OwmCondition>,
    main: OwmMain,
    #[serde(default)]
    wind: Option<OwmWind>,
    #[serde(default)]
    rain: Option<OwmRain>,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmRain {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
}

impl From<OwmResponse> for WeatherData {
    fn from(raw: OwmResponse) -> Self {
        let forecast = raw
            .weather
            .iter()
            .map(|c| capitalize(&c.description))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            temperature: raw.main.temp,
            humidity: raw.main.humidity,
            // m/s to km/h
            wind_speed: raw.wind.map(|w| (w.speed * 3.6 * 10.0).round() / 10.0).unwrap_or(0.0),
            precipitation: raw.rain.and_then(|r| r.one_hour).unwrap_or(0.0),
            forecast,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct WeatherService {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl WeatherService {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn current(&self, location: &str) -> Result<WeatherData, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::NotConfigured)?;
        tracing::debug!(location, "Fetching weather");

        let res = self
            .http
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .send()
            .await?;

        match res.status() {
            s if s.is_success() => {
                let body = res.text().await?;
                serde_json::from_str::<OwmResponse>(&body)
                    .map(WeatherData::from)
                    .map_err(|e| WeatherError::Serde(e.to_string()))
            }
            StatusCode::NOT_FOUND => Err(WeatherError::LocationNotFound(location.to_string())),
            StatusCode::UNAUTHORIZED => Err(WeatherError::InvalidApiKey),
            s => Err(WeatherError::Http {
                status: s.as_u16(),
                body: res.text().await.unwrap_or_default(),
            }),
        }
    }
}
