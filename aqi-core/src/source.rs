//! Parsing of the hourly upstream responses.
//!
//! Both providers answer with a columnar body:
//!
//! ```text
//! {"hourly": {"time": ["2024-11-01T00:00", ...], "pm10": [41.2, null, ...], ...}}
//! ```
//!
//! Every column must have one value per `time` entry. Duplicate timestamps
//! keep their last occurrence and rows come back in ascending timestamp order.

use crate::error::{AqiError, Result};
use crate::observation::{PollutantRow, WeatherRow};
use aqi_utils::dates::parse_hour;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Provider name used in errors and logs for the air-quality source.
pub const AIR_QUALITY_PROVIDER: &str = "air-quality";

/// Provider name used in errors and logs for the weather source.
pub const WEATHER_PROVIDER: &str = "weather";

/// Hourly fields requested from the air-quality provider.
pub const AIR_QUALITY_FIELDS: &str =
    "european_aqi,pm10,pm2_5,carbon_monoxide,carbon_dioxide,sulphur_dioxide,ozone,nitrogen_dioxide";

/// Hourly fields requested from the weather provider.
pub const WEATHER_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m";

#[derive(Debug, Deserialize)]
struct Envelope<H> {
    hourly: Option<H>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AirQualityHourly {
    time: Vec<String>,
    #[serde(default)]
    pm10: Vec<Option<f64>>,
    #[serde(default)]
    pm2_5: Vec<Option<f64>>,
    #[serde(default)]
    carbon_monoxide: Vec<Option<f64>>,
    #[serde(default)]
    carbon_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    sulphur_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    ozone: Vec<Option<f64>>,
    #[serde(default)]
    nitrogen_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    european_aqi: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct WeatherHourly {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
}

/// Response body of the air-quality provider.
pub struct AirQualityResponse;

/// Response body of the weather provider.
pub struct WeatherResponse;

impl AirQualityResponse {
    /// Parse an air-quality response body into rows.
    pub fn parse(body: &str) -> Result<Vec<PollutantRow>> {
        let hourly: AirQualityHourly = hourly_block(AIR_QUALITY_PROVIDER, body)?;
        let times = parse_times(AIR_QUALITY_PROVIDER, &hourly.time)?;
        let len = times.len();
        let columns = [
            ("pm10", &hourly.pm10),
            ("pm2_5", &hourly.pm2_5),
            ("carbon_monoxide", &hourly.carbon_monoxide),
            ("carbon_dioxide", &hourly.carbon_dioxide),
            ("sulphur_dioxide", &hourly.sulphur_dioxide),
            ("ozone", &hourly.ozone),
            ("nitrogen_dioxide", &hourly.nitrogen_dioxide),
            ("european_aqi", &hourly.european_aqi),
        ];
        for (name, column) in columns {
            check_column(AIR_QUALITY_PROVIDER, name, column.len(), len)?;
        }

        let mut by_time: BTreeMap<NaiveDateTime, PollutantRow> = BTreeMap::new();
        for (i, timestamp) in times.into_iter().enumerate() {
            by_time.insert(
                timestamp,
                PollutantRow {
                    timestamp,
                    pm2_5: hourly.pm2_5[i],
                    pm10: hourly.pm10[i],
                    ozone: hourly.ozone[i],
                    carbon_monoxide: hourly.carbon_monoxide[i],
                    carbon_dioxide: hourly.carbon_dioxide[i],
                    sulphur_dioxide: hourly.sulphur_dioxide[i],
                    nitrogen_dioxide: hourly.nitrogen_dioxide[i],
                    european_aqi: hourly.european_aqi[i],
                },
            );
        }
        log::info!(
            "[AQI] source: parsed {} {} rows",
            by_time.len(),
            AIR_QUALITY_PROVIDER
        );
        Ok(by_time.into_values().collect())
    }
}

impl WeatherResponse {
    /// Parse a weather response body into rows.
    pub fn parse(body: &str) -> Result<Vec<WeatherRow>> {
        let hourly: WeatherHourly = hourly_block(WEATHER_PROVIDER, body)?;
        let times = parse_times(WEATHER_PROVIDER, &hourly.time)?;
        let len = times.len();
        let columns = [
            ("temperature_2m", &hourly.temperature_2m),
            ("relative_humidity_2m", &hourly.relative_humidity_2m),
            ("wind_speed_10m", &hourly.wind_speed_10m),
        ];
        for (name, column) in columns {
            check_column(WEATHER_PROVIDER, name, column.len(), len)?;
        }

        let mut by_time: BTreeMap<NaiveDateTime, WeatherRow> = BTreeMap::new();
        for (i, timestamp) in times.into_iter().enumerate() {
            by_time.insert(
                timestamp,
                WeatherRow {
                    timestamp,
                    temperature: hourly.temperature_2m[i],
                    relative_humidity: hourly.relative_humidity_2m[i],
                    wind_speed: hourly.wind_speed_10m[i],
                },
            );
        }
        log::info!(
            "[AQI] source: parsed {} {} rows",
            by_time.len(),
            WEATHER_PROVIDER
        );
        Ok(by_time.into_values().collect())
    }
}

fn hourly_block<H: serde::de::DeserializeOwned>(provider: &str, body: &str) -> Result<H> {
    let envelope: Envelope<H> = serde_json::from_str(body)
        .map_err(|e| AqiError::source_unavailable(provider, format!("malformed body: {e}")))?;
    match envelope.hourly {
        Some(hourly) => Ok(hourly),
        None => {
            let reason = envelope
                .reason
                .unwrap_or_else(|| String::from("response has no hourly block"));
            Err(AqiError::source_unavailable(provider, reason))
        }
    }
}

fn parse_times(provider: &str, raw: &[String]) -> Result<Vec<NaiveDateTime>> {
    if raw.is_empty() {
        return Err(AqiError::source_unavailable(provider, "response has no rows"));
    }
    raw.iter()
        .map(|s| {
            parse_hour(s).map_err(|e| {
                AqiError::source_unavailable(provider, format!("bad timestamp `{s}`: {e}"))
            })
        })
        .collect()
}

fn check_column(provider: &str, name: &str, found: usize, expected: usize) -> Result<()> {
    if found != expected {
        return Err(AqiError::source_unavailable(
            provider,
            format!("column `{name}` has {found} values, expected {expected}"),
        ));
    }
    Ok(())
}
