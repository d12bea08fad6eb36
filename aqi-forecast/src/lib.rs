//! Serving side of the pipeline.
//!
//! [`ForecastEngine`] applies a loaded model to every row of a normalized
//! window and splits the result at an explicit "now": rows at or before it
//! form the actual segment, rows after it the forecast segment. [`classify`]
//! maps an AQI to its health-risk category and [`alert`] fires when a
//! forecast-segment prediction is above 150.

pub mod engine;
pub mod risk;

pub use engine::{alert, CurrentConditions, Forecast, ForecastEngine, PredictionRecord, Segment};
pub use risk::{classify, AqiCategory, ALERT_THRESHOLD};
