use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One hourly row from the upstream air-quality provider.
///
/// Every value is optional; the provider reports `null` for hours it has no
/// data for, and `european_aqi` is absent beyond the observed horizon.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PollutantRow {
    pub timestamp: NaiveDateTime,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub ozone: Option<f64>,
    pub carbon_monoxide: Option<f64>,
    pub carbon_dioxide: Option<f64>,
    pub sulphur_dioxide: Option<f64>,
    pub nitrogen_dioxide: Option<f64>,
    pub european_aqi: Option<f64>,
}

/// One hourly row from the upstream weather provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherRow {
    pub timestamp: NaiveDateTime,
    pub temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// A normalized hourly row of pollutant, weather and calendar fields.
///
/// After normalization every pollutant and weather field is present. Only the
/// reference severity index may be absent, which marks a pure-forecast row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Hour-granularity, timezone-naive UTC timestamp
    pub timestamp: NaiveDateTime,
    pub pm2_5: f64,
    pub pm10: f64,
    pub ozone: f64,
    pub carbon_monoxide: f64,
    pub carbon_dioxide: f64,
    pub sulphur_dioxide: f64,
    pub nitrogen_dioxide: f64,
    /// Reference severity index; `None` for pure-forecast rows
    pub european_aqi: Option<f64>,
    /// Air temperature at 2m, °C
    pub temperature: f64,
    /// Relative humidity at 2m, %
    pub relative_humidity: f64,
    /// Wind speed at 10m, km/h
    pub wind_speed: f64,
    /// 0..=23
    pub hour: u32,
    /// 1..=31
    pub day: u32,
    /// 1..=12
    pub month: u32,
    pub location: String,
}

impl ObservationRecord {
    /// True if the row carries ground truth for training.
    pub fn is_labelled(&self) -> bool {
        self.european_aqi.is_some_and(f64::is_finite)
    }
}
