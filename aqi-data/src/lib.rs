//! Normalization of raw pollutant and weather series.
//!
//! This crate turns the two hourly upstream series into one ascending
//! sequence of [`ObservationRecord`]s: inner join on timestamp, calendar
//! fields, forward-fill of gaps.

use aqi_core::error::{AqiError, Result};
use aqi_core::location::Location;
use aqi_core::observation::{ObservationRecord, PollutantRow, WeatherRow};
use aqi_utils::dates::calendar_fields;

pub use fill::{forward_fill, PartialRecord, FILLED_FIELDS};
pub use merge::inner_join;

/// Inner join of the two sources on timestamp.
pub mod merge {
    use super::fill::PartialRecord;
    use aqi_core::observation::{PollutantRow, WeatherRow};
    use chrono::NaiveDateTime;
    use std::collections::BTreeMap;

    /// Join pollutant and weather rows on timestamp.
    ///
    /// A timestamp missing from either side is dropped, so the output covers
    /// only the intersection of both sources. Output is ascending by
    /// timestamp; a timestamp repeated within one side keeps its last row.
    pub fn inner_join(pollutants: &[PollutantRow], weather: &[WeatherRow]) -> Vec<PartialRecord> {
        let weather_by_time: BTreeMap<NaiveDateTime, &WeatherRow> =
            weather.iter().map(|row| (row.timestamp, row)).collect();
        let pollutants_by_time: BTreeMap<NaiveDateTime, &PollutantRow> =
            pollutants.iter().map(|row| (row.timestamp, row)).collect();

        pollutants_by_time
            .into_iter()
            .filter_map(|(timestamp, pollutant)| {
                weather_by_time
                    .get(&timestamp)
                    .map(|weather| PartialRecord::from_rows(pollutant, weather))
            })
            .collect()
    }

}

/// Forward-fill of missing pollutant and weather values.
pub mod fill {
    use aqi_core::observation::{PollutantRow, WeatherRow};
    use chrono::NaiveDateTime;

    /// Fields that are forward-filled, in [`PartialRecord::values`] order.
    ///
    /// The reference index is not listed: an absent reference index marks a
    /// pure-forecast row and must stay absent.
    pub const FILLED_FIELDS: [&str; 10] = [
        "pm2_5",
        "pm10",
        "ozone",
        "carbon_monoxide",
        "carbon_dioxide",
        "sulphur_dioxide",
        "nitrogen_dioxide",
        "temperature",
        "relative_humidity",
        "wind_speed",
    ];

    /// A joined row before gap filling.
    #[derive(Debug, Clone, PartialEq)]
    pub struct PartialRecord {
        pub timestamp: NaiveDateTime,
        /// Values for [`FILLED_FIELDS`], in the same order
        pub values: [Option<f64>; 10],
        pub european_aqi: Option<f64>,
    }

    impl PartialRecord {
        pub fn from_rows(pollutant: &PollutantRow, weather: &WeatherRow) -> Self {
            PartialRecord {
                timestamp: pollutant.timestamp,
                values: [
                    pollutant.pm2_5,
                    pollutant.pm10,
                    pollutant.ozone,
                    pollutant.carbon_monoxide,
                    pollutant.carbon_dioxide,
                    pollutant.sulphur_dioxide,
                    pollutant.nitrogen_dioxide,
                    weather.temperature,
                    weather.relative_humidity,
                    weather.wind_speed,
                ],
                european_aqi: pollutant.european_aqi,
            }
        }
    }

    /// Replace each missing value with the most recent prior value of the
    /// same field.
    ///
    /// Rows must already be in ascending timestamp order. A field with no
    /// prior value stays `None`.
    pub fn forward_fill(rows: &mut [PartialRecord]) {
        let mut last: [Option<f64>; 10] = [None; 10];
        for row in rows.iter_mut() {
            for (value, previous) in row.values.iter_mut().zip(last.iter_mut()) {
                if let Some(v) = value.filter(|v| v.is_finite()) {
                    *previous = Some(v);
                } else {
                    *value = *previous;
                }
            }
        }
    }

}

/// Merge the two raw series into normalized records.
///
/// Inner joins on timestamp, forward-fills pollutant and weather gaps and
/// derives hour/day/month from the timestamp. Output is ascending by
/// timestamp with unique timestamps.
///
/// Fails with [`AqiError::DataGap`] if a field is still missing after the
/// fill (only possible at the start of the window), and with
/// [`AqiError::SourceUnavailable`] if the two sources share no timestamp.
pub fn normalize(
    pollutants: &[PollutantRow],
    weather: &[WeatherRow],
    location: &Location,
) -> Result<Vec<ObservationRecord>> {
    let mut rows = inner_join(pollutants, weather);
    log::info!(
        "[AQI] normalize: joined {} rows from {} pollutant and {} weather rows",
        rows.len(),
        pollutants.len(),
        weather.len()
    );
    if rows.is_empty() {
        return Err(AqiError::source_unavailable(
            "air-quality+weather",
            "sources share no timestamps",
        ));
    }

    forward_fill(&mut rows);

    rows.into_iter()
        .map(|row| into_record(row, location))
        .collect()
}

fn into_record(row: PartialRecord, location: &Location) -> Result<ObservationRecord> {
    let mut filled = [0.0; 10];
    for (i, value) in row.values.iter().enumerate() {
        filled[i] = value.ok_or_else(|| AqiError::DataGap {
            field: FILLED_FIELDS[i],
            timestamp: row.timestamp,
        })?;
    }
    let [pm2_5, pm10, ozone, carbon_monoxide, carbon_dioxide, sulphur_dioxide, nitrogen_dioxide, temperature, relative_humidity, wind_speed] =
        filled;
    let (hour, day, month) = calendar_fields(&row.timestamp);
    Ok(ObservationRecord {
        timestamp: row.timestamp,
        pm2_5,
        pm10,
        ozone,
        carbon_monoxide,
        carbon_dioxide,
        sulphur_dioxide,
        nitrogen_dioxide,
        european_aqi: row.european_aqi.filter(|v| v.is_finite()),
        temperature,
        relative_humidity,
        wind_speed,
        hour,
        day,
        month,
        location: location.tag.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqi_core::source::{AirQualityResponse, WeatherResponse};
    use aqi_utils::dates::format_hour;

    const AIR_QUALITY_BODY: &str = include_str!("../../fixtures/air_quality.json");
    const WEATHER_BODY: &str = include_str!("../../fixtures/weather.json");

    #[test]
    fn test_normalize_fixtures() {
        let pollutants = AirQualityResponse::parse(AIR_QUALITY_BODY).unwrap();
        let weather = WeatherResponse::parse(WEATHER_BODY).unwrap();
        let records = normalize(&pollutants, &weather, &Location::karachi()).unwrap();

        // pollutants cover 00..05, weather 01..06
        assert_eq!(records.len(), 5);
        assert_eq!(format_hour(&records[0].timestamp), "2024-11-01T01:00");
        assert_eq!(format_hour(&records[4].timestamp), "2024-11-01T05:00");

        // ozone missing at 02:00 is filled from 01:00
        assert_eq!(records[1].ozone, 49.0);
        // wind speed missing at 04:00 is filled from 03:00
        assert_eq!(records[3].wind_speed, 8.1);
        // the reference index stays absent beyond the observed horizon
        assert_eq!(records[4].european_aqi, None);
        assert_eq!(records[3].european_aqi, Some(73.0));

        assert_eq!(records[0].hour, 1);
        assert_eq!(records[0].day, 1);
        assert_eq!(records[0].month, 11);
        assert!(records.iter().all(|r| r.location == "karachi"));
    }

    #[test]
    fn test_normalize_leading_gap_is_data_gap() {
        let mut pollutants = AirQualityResponse::parse(AIR_QUALITY_BODY).unwrap();
        let weather = WeatherResponse::parse(WEATHER_BODY).unwrap();
        // first joined row is 01:00
        pollutants[1].sulphur_dioxide = None;
        let err = normalize(&pollutants, &weather, &Location::karachi()).unwrap_err();
        match err {
            AqiError::DataGap { field, timestamp } => {
                assert_eq!(field, "sulphur_dioxide");
                assert_eq!(format_hour(&timestamp), "2024-11-01T01:00");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_normalize_disjoint_sources_fail() {
        let pollutants = AirQualityResponse::parse(AIR_QUALITY_BODY).unwrap();
        let weather = WeatherResponse::parse(WEATHER_BODY).unwrap();
        let err = normalize(&pollutants[..1], &weather, &Location::karachi()).unwrap_err();
        assert!(matches!(err, AqiError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_timestamps_unique_and_ascending() {
        let pollutants = AirQualityResponse::parse(AIR_QUALITY_BODY).unwrap();
        let weather = WeatherResponse::parse(WEATHER_BODY).unwrap();
        let records = normalize(&pollutants, &weather, &Location::karachi()).unwrap();
        assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
