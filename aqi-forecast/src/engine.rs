//! Apply a loaded model to a normalized window and split it at "now".

use crate::risk::{classify, exceeds_threshold, AqiCategory};
use aqi_core::observation::ObservationRecord;
use aqi_model::Regressor;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Days of history shown before "now" in the chart window.
pub const CHART_DAYS_BEFORE: i64 = 5;
/// Days of forecast shown after "now" in the chart window.
pub const CHART_DAYS_AFTER: i64 = 3;

/// Which side of the evaluation instant a row falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    /// timestamp <= now
    Actual,
    /// timestamp > now
    Forecast,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Actual => f.write_str("actual"),
            Segment::Forecast => f.write_str("forecast"),
        }
    }
}

/// An observation with the model's prediction and its category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub record: ObservationRecord,
    pub predicted_aqi: f64,
    pub category: AqiCategory,
    pub segment: Segment,
}

impl PredictionRecord {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.record.timestamp
    }

    /// The value to show for this row: the reference index where it is
    /// already known (actual segment), the prediction otherwise.
    pub fn displayed_aqi(&self) -> Option<f64> {
        match self.segment {
            Segment::Actual => self.record.european_aqi,
            Segment::Forecast => Some(self.predicted_aqi),
        }
    }
}

/// The latest row of a window, reported as current conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub timestamp: NaiveDateTime,
    pub reference_aqi: Option<f64>,
    pub predicted_aqi: f64,
    pub category: AqiCategory,
}

/// Predictions for a window, ascending by timestamp, split at `now`.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    rows: Vec<PredictionRecord>,
    split: usize,
    now: NaiveDateTime,
}

impl Forecast {
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn rows(&self) -> &[PredictionRecord] {
        &self.rows
    }

    /// Rows at or before `now`.
    pub fn actual(&self) -> &[PredictionRecord] {
        &self.rows[..self.split]
    }

    /// Rows strictly after `now`.
    pub fn forecast(&self) -> &[PredictionRecord] {
        &self.rows[self.split..]
    }

    pub fn current(&self) -> Option<CurrentConditions> {
        self.rows.last().map(|row| CurrentConditions {
            timestamp: row.timestamp(),
            reference_aqi: row.record.european_aqi,
            predicted_aqi: row.predicted_aqi,
            category: row.category,
        })
    }

    /// Rows within `now - 5 days ..= now + 3 days`.
    pub fn chart_window(&self) -> &[PredictionRecord] {
        let start = self.now - Duration::days(CHART_DAYS_BEFORE);
        let end = self.now + Duration::days(CHART_DAYS_AFTER);
        let from = self.rows.partition_point(|row| row.timestamp() < start);
        let to = self.rows.partition_point(|row| row.timestamp() <= end);
        &self.rows[from..to]
    }

    /// True iff a forecast-segment prediction is above the alert threshold.
    pub fn alert(&self) -> bool {
        alert(self.forecast())
    }
}

/// True iff any row's predicted AQI is strictly above 150.
pub fn alert(forecast_segment: &[PredictionRecord]) -> bool {
    exceeds_threshold(forecast_segment.iter().map(|row| row.predicted_aqi))
}

/// Holds a loaded model read-only and applies it to serving windows.
pub struct ForecastEngine<M> {
    model: M,
}

impl<M: Regressor> ForecastEngine<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Predict every row of `records`, with or without a reference index,
    /// and partition the result at `now`.
    pub fn forecast(&self, records: &[ObservationRecord], now: NaiveDateTime) -> Forecast {
        let mut rows: Vec<PredictionRecord> = records
            .iter()
            .map(|record| {
                let predicted_aqi = self.model.predict(&record.feature_vector());
                let segment = if record.timestamp <= now {
                    Segment::Actual
                } else {
                    Segment::Forecast
                };
                PredictionRecord {
                    record: record.clone(),
                    predicted_aqi,
                    category: classify(predicted_aqi),
                    segment,
                }
            })
            .collect();
        rows.sort_by_key(|row| row.timestamp());
        let split = rows.partition_point(|row| row.segment == Segment::Actual);

        let forecast = Forecast { rows, split, now };
        log::info!(
            "[AQI] forecast: {} actual and {} forecast rows at {}",
            forecast.actual().len(),
            forecast.forecast().len(),
            now.format("%Y-%m-%d %H:%M")
        );
        if forecast.alert() {
            log::warn!("[AQI] forecast: predicted AQI above the alert threshold");
        }
        forecast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqi_core::location::KARACHI_TAG;
    use aqi_core::schema::FeatureVector;
    use chrono::{Datelike, NaiveDate, Timelike};

    /// Predicts the record's pm2_5, so tests pick the prediction directly.
    struct Echo;

    impl Regressor for Echo {
        fn predict(&self, features: &FeatureVector) -> f64 {
            features[0]
        }
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn record(timestamp: NaiveDateTime, pm2_5: f64, reference: Option<f64>) -> ObservationRecord {
        ObservationRecord {
            timestamp,
            pm2_5,
            pm10: 60.0,
            ozone: 50.0,
            carbon_monoxide: 400.0,
            carbon_dioxide: 420.0,
            sulphur_dioxide: 9.0,
            nitrogen_dioxide: 18.0,
            european_aqi: reference,
            temperature: 24.0,
            relative_humidity: 70.0,
            wind_speed: 9.0,
            hour: timestamp.hour(),
            day: timestamp.day(),
            month: timestamp.month(),
            location: KARACHI_TAG.to_string(),
        }
    }

    /// Hourly window from `now - 5 days` to `now + 3 days`.
    fn window(now: NaiveDateTime) -> Vec<ObservationRecord> {
        let start = now - Duration::days(5);
        (0..=8 * 24)
            .map(|h| {
                let ts = start + Duration::hours(h);
                let reference = (ts <= now).then_some(60.0);
                record(ts, 40.0 + (h % 24) as f64, reference)
            })
            .collect()
    }

    #[test]
    fn four_row_scenario() {
        let now = at(10, 12);
        let records = vec![
            record(at(10, 10), 40.0, Some(45.0)),
            record(at(10, 12), 90.0, Some(88.0)),
            record(at(10, 13), 160.0, None),
            record(at(10, 14), 210.0, None),
        ];
        let forecast = ForecastEngine::new(Echo).forecast(&records, now);

        let actual: Vec<f64> = forecast.actual().iter().map(|r| r.predicted_aqi).collect();
        let ahead: Vec<f64> = forecast.forecast().iter().map(|r| r.predicted_aqi).collect();
        assert_eq!(actual, vec![40.0, 90.0]);
        assert_eq!(ahead, vec![160.0, 210.0]);

        // actual rows show the reference index, forecast rows the prediction
        assert_eq!(forecast.actual()[0].displayed_aqi(), Some(45.0));
        assert_eq!(forecast.actual()[1].displayed_aqi(), Some(88.0));
        assert_eq!(forecast.forecast()[1].displayed_aqi(), Some(210.0));

        assert_eq!(forecast.forecast()[1].category, AqiCategory::VeryUnhealthy);
        assert!(forecast.alert());
    }

    #[test]
    fn every_row_is_predicted() {
        let now = at(10, 0);
        let forecast = ForecastEngine::new(Echo).forecast(&window(now), now);
        assert_eq!(forecast.rows().len(), 8 * 24 + 1);
        assert!(forecast.rows().iter().all(|r| r.predicted_aqi.is_finite()));
    }

    #[test]
    fn partition_is_complete_and_ordered() {
        let now = at(10, 7);
        let records = window(now);
        let forecast = ForecastEngine::new(Echo).forecast(&records, now);

        assert_eq!(
            forecast.actual().len() + forecast.forecast().len(),
            records.len()
        );
        assert!(forecast.actual().iter().all(|r| r.timestamp() <= now));
        assert!(forecast.forecast().iter().all(|r| r.timestamp() > now));
        assert!(forecast.actual().iter().all(|r| r.segment == Segment::Actual));
        // the row exactly at now is actual
        assert_eq!(forecast.actual().last().unwrap().timestamp(), now);
        assert_eq!(forecast.forecast().len(), 3 * 24);
    }

    #[test]
    fn unsorted_input_is_ordered() {
        let now = at(10, 12);
        let records = vec![
            record(at(10, 14), 70.0, None),
            record(at(10, 10), 40.0, Some(41.0)),
            record(at(10, 13), 60.0, None),
        ];
        let forecast = ForecastEngine::new(Echo).forecast(&records, now);
        let times: Vec<_> = forecast.rows().iter().map(|r| r.timestamp()).collect();
        assert_eq!(times, vec![at(10, 10), at(10, 13), at(10, 14)]);
        assert_eq!(forecast.actual().len(), 1);
    }

    #[test]
    fn current_is_latest_row() {
        let now = at(10, 12);
        let records = vec![
            record(at(10, 11), 30.0, Some(33.0)),
            record(at(10, 15), 120.0, None),
        ];
        let current = ForecastEngine::new(Echo)
            .forecast(&records, now)
            .current()
            .unwrap();
        assert_eq!(current.timestamp, at(10, 15));
        assert_eq!(current.reference_aqi, None);
        assert_eq!(current.predicted_aqi, 120.0);
        assert_eq!(current.category, AqiCategory::UnhealthyForSensitiveGroups);

        assert!(ForecastEngine::new(Echo)
            .forecast(&[], now)
            .current()
            .is_none());
    }

    #[test]
    fn alert_ignores_actual_segment() {
        let now = at(10, 12);
        let records = vec![
            record(at(10, 11), 250.0, Some(240.0)),
            record(at(10, 13), 90.0, None),
        ];
        let forecast = ForecastEngine::new(Echo).forecast(&records, now);
        assert!(!forecast.alert());
    }

    #[test]
    fn alert_turns_on_past_threshold() {
        let now = at(10, 12);
        let mut records = vec![
            record(at(10, 13), 100.0, None),
            record(at(10, 14), 150.0, None),
        ];
        assert!(!ForecastEngine::new(Echo).forecast(&records, now).alert());
        records[1].pm2_5 = 150.5;
        assert!(ForecastEngine::new(Echo).forecast(&records, now).alert());
    }

    #[test]
    fn chart_window_bounds() {
        let now = at(10, 12);
        let mut records = window(now);
        // one row on each side outside the window
        records.push(record(now - Duration::days(6), 40.0, Some(40.0)));
        records.push(record(now + Duration::days(4), 40.0, None));
        let forecast = ForecastEngine::new(Echo).forecast(&records, now);

        let chart = forecast.chart_window();
        assert_eq!(chart.len(), 8 * 24 + 1);
        assert_eq!(chart.first().unwrap().timestamp(), now - Duration::days(5));
        assert_eq!(chart.last().unwrap().timestamp(), now + Duration::days(3));
    }
}
