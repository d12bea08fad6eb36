//! Serve a forecast: load the model, fetch a fresh window, predict and report.

use crate::ingest::fetch;
use crate::{pipeline, staged};
use anyhow::Context;
use aqi_core::open_meteo::{FetchWindow, OpenMeteoClient};
use aqi_forecast::{Forecast, PredictionRecord, Segment};
use aqi_model::Evaluation;
use aqi_utils::dates::format_hour;
use chrono::{NaiveDateTime, Utc};
use log::info;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

pub const ALERT_MESSAGE: &str =
    "Warning: Unhealthy air quality expected in the next 3 days. Limit outdoor activities.";
pub const CLEAR_MESSAGE: &str = "Air quality is expected to remain moderate or good.";

/// Rows of the prediction table shown in the report.
const PREVIEW_ROWS: usize = 20;

pub async fn run_predict(
    model_path: &Path,
    past_days: u32,
    forecast_days: u32,
    now: Option<NaiveDateTime>,
    csv_path: Option<&Path>,
) -> anyhow::Result<()> {
    let engine = pipeline::load_engine(model_path)?;

    let client = OpenMeteoClient::new(Default::default()).map_err(staged)?;
    let window = FetchWindow {
        past_days,
        forecast_days,
    };
    let (pollutants, weather) = fetch(&client, &window).await?;

    let now = now.unwrap_or_else(|| Utc::now().naive_utc());
    let forecast = pipeline::forecast(&engine, &pollutants, &weather, client.location(), now)?;

    if let Some(path) = csv_path {
        write_csv(path, &forecast)
            .with_context(|| format!("writing prediction table to {}", path.display()))?;
        info!("Prediction table written to {}", path.display());
    }
    print!("{}", report(&forecast, engine.model().metrics()));
    Ok(())
}

/// The alert line for a forecast.
pub fn alert_message(forecast: &Forecast) -> &'static str {
    if forecast.alert() {
        ALERT_MESSAGE
    } else {
        CLEAR_MESSAGE
    }
}

/// Plain-text report: current conditions, model metrics, the tail of the
/// prediction table and the alert.
pub fn report(forecast: &Forecast, metrics: &Evaluation) -> String {
    let mut out = String::new();
    if let Some(current) = forecast.current() {
        let _ = writeln!(out, "Current conditions ({})", format_hour(&current.timestamp));
        let _ = writeln!(out, "  European AQI:  {}", fmt_aqi(current.reference_aqi));
        let _ = writeln!(out, "  Predicted AQI: {:.1}", current.predicted_aqi);
        let _ = writeln!(out, "  Condition:     {}", current.category);
        out.push('\n');
    }
    let _ = writeln!(out, "Model: random forest, held-out {metrics}");
    let _ = writeln!(
        out,
        "Window: {} actual rows, {} forecast rows\n",
        forecast.actual().len(),
        forecast.forecast().len()
    );

    let _ = writeln!(
        out,
        "{:<17} {:<8} {:>9} {:>9} {:>9}  category",
        "timestamp", "segment", "reference", "predicted", "displayed"
    );
    let rows = forecast.rows();
    for row in &rows[rows.len().saturating_sub(PREVIEW_ROWS)..] {
        let _ = writeln!(
            out,
            "{:<17} {:<8} {:>9} {:>9.1} {:>9}  {}",
            format_hour(&row.timestamp()),
            row.segment.to_string(),
            fmt_aqi(row.record.european_aqi),
            row.predicted_aqi,
            fmt_aqi(row.displayed_aqi()),
            row.category
        );
    }
    out.push('\n');
    out.push_str(alert_message(forecast));
    out.push('\n');
    out
}

fn fmt_aqi(value: Option<f64>) -> String {
    value.map_or_else(|| String::from("-"), |v| format!("{v:.1}"))
}

#[derive(Serialize)]
struct CsvRow {
    timestamp: String,
    segment: Segment,
    reference: Option<f64>,
    predicted: f64,
    displayed: Option<f64>,
    category: &'static str,
}

impl From<&PredictionRecord> for CsvRow {
    fn from(row: &PredictionRecord) -> Self {
        CsvRow {
            timestamp: format_hour(&row.timestamp()),
            segment: row.segment,
            reference: row.record.european_aqi,
            predicted: row.predicted_aqi,
            displayed: row.displayed_aqi(),
            category: row.category.label(),
        }
    }
}

/// Write the whole prediction table as CSV with a header row.
pub fn write_csv(path: &Path, forecast: &Forecast) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in forecast.rows() {
        writer.serialize(CsvRow::from(row))?;
    }
    writer.flush()?;
    Ok(())
}
