//! Open-Meteo client for the two hourly upstream sources.
//!
//! Failures are surfaced as [`AqiError::SourceUnavailable`] on the first
//! attempt; callers own any retry policy.

use crate::error::{AqiError, Result};
use crate::location::Location;
use crate::observation::{PollutantRow, WeatherRow};
use crate::source::{
    AirQualityResponse, WeatherResponse, AIR_QUALITY_FIELDS, AIR_QUALITY_PROVIDER,
    WEATHER_FIELDS, WEATHER_PROVIDER,
};
use log::info;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const AIR_QUALITY_ENDPOINT: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";
const WEATHER_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

/// Atmospheric model domain used for the air-quality query.
const AIR_QUALITY_DOMAIN: &str = "cams_global";

/// How far back and ahead to query, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub past_days: u32,
    pub forecast_days: u32,
}

impl Default for FetchWindow {
    fn default() -> Self {
        FetchWindow {
            past_days: 92,
            forecast_days: 3,
        }
    }
}

pub struct OpenMeteoClient {
    client: Client,
    location: Location,
}

impl OpenMeteoClient {
    pub fn new(location: Location) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AqiError::source_unavailable("http-client", e))?;
        Ok(OpenMeteoClient { client, location })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn air_quality_url(&self, window: &FetchWindow) -> String {
        format!(
            "{}?latitude={}&longitude={}&hourly={}&past_days={}&forecast_days={}&domains={}",
            AIR_QUALITY_ENDPOINT,
            self.location.latitude,
            self.location.longitude,
            AIR_QUALITY_FIELDS,
            window.past_days,
            window.forecast_days,
            AIR_QUALITY_DOMAIN
        )
    }

    pub fn weather_url(&self, window: &FetchWindow) -> String {
        format!(
            "{}?latitude={}&longitude={}&hourly={}&past_days={}&forecast_days={}",
            WEATHER_ENDPOINT,
            self.location.latitude,
            self.location.longitude,
            WEATHER_FIELDS,
            window.past_days,
            window.forecast_days
        )
    }

    /// Fetch the hourly pollutant series for the window.
    pub async fn fetch_air_quality(&self, window: &FetchWindow) -> Result<Vec<PollutantRow>> {
        let url = self.air_quality_url(window);
        let body = self.get_body(AIR_QUALITY_PROVIDER, &url).await?;
        AirQualityResponse::parse(&body)
    }

    /// Fetch the hourly weather series for the window.
    pub async fn fetch_weather(&self, window: &FetchWindow) -> Result<Vec<WeatherRow>> {
        let url = self.weather_url(window);
        let body = self.get_body(WEATHER_PROVIDER, &url).await?;
        WeatherResponse::parse(&body)
    }

    async fn get_body(&self, provider: &str, url: &str) -> Result<String> {
        info!("[AQI] fetch: {} {}", provider, url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AqiError::source_unavailable(provider, format!("request failed: {e}")))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AqiError::source_unavailable(provider, format!("failed to read body: {e}"))
        })?;
        if status != StatusCode::OK {
            // Open-Meteo explains rejected queries in the body
            return Err(AqiError::source_unavailable(
                provider,
                format!("bad response status {status}: {body}"),
            ));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_carry_location_and_window() {
        let client = OpenMeteoClient::new(Location::karachi()).unwrap();
        let window = FetchWindow::default();

        let air = client.air_quality_url(&window);
        assert!(air.starts_with(AIR_QUALITY_ENDPOINT));
        assert!(air.contains("latitude=24.8608"));
        assert!(air.contains("longitude=67.0104"));
        assert!(air.contains("past_days=92"));
        assert!(air.contains("forecast_days=3"));
        assert!(air.contains("european_aqi"));
        assert!(air.contains("domains=cams_global"));

        let weather = client.weather_url(&window);
        assert!(weather.starts_with(WEATHER_ENDPOINT));
        assert!(weather.contains("wind_speed_10m"));
        assert!(!weather.contains("domains="));
    }
}
